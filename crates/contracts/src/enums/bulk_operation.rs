use serde::{Deserialize, Serialize};

/// Вид массовой операции над заказами
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperationKind {
    /// Проверка -> выгрузка -> отгрузка, по одному заказу за раз
    ExportAndShip,
    /// Сверка состояния с ERP одним пакетным запросом
    Reconcile,
}

impl BulkOperationKind {
    pub fn code(&self) -> &'static str {
        match self {
            BulkOperationKind::ExportAndShip => "exportAndShip",
            BulkOperationKind::Reconcile => "reconcile",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BulkOperationKind::ExportAndShip => "Выгрузка и отгрузка",
            BulkOperationKind::Reconcile => "Сверка с ERP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "exportAndShip" => Some(BulkOperationKind::ExportAndShip),
            "reconcile" => Some(BulkOperationKind::Reconcile),
            _ => None,
        }
    }
}
