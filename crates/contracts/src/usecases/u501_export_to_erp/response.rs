use crate::enums::bulk_operation::BulkOperationKind;
use crate::usecases::u502_reconcile_with_erp::response::ReconcileItem;
use serde::{Deserialize, Serialize};

/// Состояние конвейера выгрузки одного заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportRunState {
    Pending,
    Validating,
    Validated,
    /// Не настроен канал или способ оплаты; повтор бесполезен до правки настроек
    ValidationFailedCritical,
    /// Отказ ERP при проверке; можно повторить после изменения данных
    ValidationFailedRecoverable,
    Exported,
    ExportFailed,
    Shipped,
    ShipmentSkipped,
    ShipmentFailed,
}

impl ExportRunState {
    /// Конечное состояние: дальше конвейер не идёт
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportRunState::ValidationFailedCritical
                | ExportRunState::ValidationFailedRecoverable
                | ExportRunState::ExportFailed
                | ExportRunState::Shipped
                | ExportRunState::ShipmentSkipped
                | ExportRunState::ShipmentFailed
        )
    }
}

/// Класс ошибки для вызывающей стороны
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorKind {
    CriticalConfiguration,
    RecoverableValidation,
    Export,
    Shipment,
    Network,
    AlreadyInProgress,
    OrderNotFound,
    Storage,
}

/// Ошибка с исходным сообщением ERP/витрины
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub kind: ExportErrorKind,
    pub message: String,
    /// Повтор имеет смысл без правки настроек
    #[serde(default)]
    pub retryable: bool,
}

/// Как завершилась выгрузка заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportResultKind {
    /// Создан новый документ
    Created,
    /// Такой документ уже есть в ERP, ничего не создано
    NoChanges,
}

/// Отчёт по одному заказу (одиночный запуск или элемент массового)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRunReport {
    #[serde(rename = "orderId")]
    pub order_id: i64,
    /// Составной номер; пустой, если заказ не найден
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    pub state: ExportRunState,
    #[serde(rename = "exportSuccess")]
    pub export_success: bool,
    #[serde(rename = "exportResult", default, skip_serializing_if = "Option::is_none")]
    pub export_result: Option<ExportResultKind>,
    #[serde(rename = "dilovodDocId", default, skip_serializing_if = "Option::is_none")]
    pub erp_doc_id: Option<String>,
    /// None: отгрузка не запускалась
    #[serde(rename = "shipmentSuccess", default, skip_serializing_if = "Option::is_none")]
    pub shipment_success: Option<bool>,
    #[serde(default)]
    pub errors: Vec<ReportedError>,
    /// Неблокирующие предупреждения (устаревшие ссылки на справочники ERP)
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl OrderRunReport {
    pub fn new(order_id: i64) -> Self {
        Self {
            order_id,
            order_number: String::new(),
            state: ExportRunState::Pending,
            export_success: false,
            export_result: None,
            erp_doc_id: None,
            shipment_success: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_critical_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.kind == ExportErrorKind::CriticalConfiguration)
    }
}

/// Итог массовой операции
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum BulkReport {
    ExportAndShip { items: Vec<OrderRunReport> },
    Reconcile { items: Vec<ReconcileItem> },
}

impl BulkReport {
    pub fn operation(&self) -> BulkOperationKind {
        match self {
            BulkReport::ExportAndShip { .. } => BulkOperationKind::ExportAndShip,
            BulkReport::Reconcile { .. } => BulkOperationKind::Reconcile,
        }
    }
}

/// Ответ на запуск фоновой массовой операции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStartResponse {
    pub session_id: String,
    pub status: BulkStartStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkStartStatus {
    Started,
    Failed,
}
