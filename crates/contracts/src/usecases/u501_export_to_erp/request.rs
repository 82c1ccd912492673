use crate::enums::bulk_operation::BulkOperationKind;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Запрос на выгрузку одного заказа в ERP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOrderRequest {
    /// Создавать ли отгрузку после успешной выгрузки заказа
    #[serde(rename = "withShipment", default = "default_true")]
    pub with_shipment: bool,
}

impl Default for ExportOrderRequest {
    fn default() -> Self {
        Self { with_shipment: true }
    }
}

/// Запрос на массовую операцию; порядок orderIds сохраняется в отчёте
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRequest {
    #[serde(rename = "orderIds")]
    pub order_ids: Vec<i64>,
    pub operation: BulkOperationKind,
}
