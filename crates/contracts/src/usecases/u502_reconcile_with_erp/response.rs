use serde::{Deserialize, Serialize};

/// Какое поле состояния выгрузки было дополнено по данным ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconciledField {
    DilovodDocId,
    DilovodExportDate,
    DilovodSaleExportDate,
    DilovodCashInDate,
}

/// Результат сверки одного заказа
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileItem {
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    /// Документ заказа найден в ERP
    pub found: bool,
    #[serde(rename = "updatedCount")]
    pub updated_count: i32,
    #[serde(rename = "updatedFields", default)]
    pub updated_fields: Vec<ReconciledField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Итог сверки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub data: Vec<ReconcileItem>,
    #[serde(rename = "totalUpdated")]
    pub total_updated: i32,
}

impl ReconcileResponse {
    pub fn from_items(data: Vec<ReconcileItem>) -> Self {
        let total_updated = data.iter().map(|i| i.updated_count).sum();
        Self { data, total_updated }
    }
}
