use serde::{Deserialize, Serialize};

/// Запрос на сверку заказов с ERP (ничего не создаёт в ERP).
/// Заказы задаются локальными id и/или составными номерами ERP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(rename = "orderIds", default)]
    pub order_ids: Vec<i64>,
    #[serde(rename = "orderNumbers", default)]
    pub order_numbers: Vec<String>,
}
