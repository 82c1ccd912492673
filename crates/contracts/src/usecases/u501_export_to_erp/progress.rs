use super::response::BulkReport;
use crate::enums::bulk_operation::BulkOperationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Текущий прогресс массовой операции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProgress {
    pub session_id: String,
    pub operation: BulkOperationKind,
    pub status: BulkStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    pub processed: i32,
    pub total: i32,
    pub succeeded: i32,
    pub failed: i32,

    /// Текущий обрабатываемый заказ
    pub current_item: Option<String>,

    pub error_messages: Vec<String>,

    /// Заполняется по завершении
    pub report: Option<BulkReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BulkStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl BulkProgress {
    pub fn new(session_id: String, operation: BulkOperationKind, total: i32) -> Self {
        Self {
            session_id,
            operation,
            status: BulkStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            updated_at: Utc::now(),
            processed: 0,
            total,
            succeeded: 0,
            failed: 0,
            current_item: None,
            error_messages: Vec::new(),
            report: None,
        }
    }
}
