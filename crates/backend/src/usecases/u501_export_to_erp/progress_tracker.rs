use contracts::enums::bulk_operation::BulkOperationKind;
use contracts::usecases::u501_export_to_erp::progress::{BulkProgress, BulkStatus};
use contracts::usecases::u501_export_to_erp::response::BulkReport;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Трекер прогресса массовых операций (in-memory, для real-time мониторинга)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, BulkProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Создать новую сессию
    pub fn create_session(&self, session_id: String, operation: BulkOperationKind, total: i32) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(
            session_id.clone(),
            BulkProgress::new(session_id, operation, total),
        );
    }

    /// Получить текущий прогресс сессии
    pub fn get_progress(&self, session_id: &str) -> Option<BulkProgress> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).cloned()
    }

    /// Установить текущий обрабатываемый заказ
    pub fn set_current_item(&self, session_id: &str, label: Option<String>) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(progress) = sessions.get_mut(session_id) {
            progress.current_item = label;
            progress.updated_at = chrono::Utc::now();
        }
    }

    /// Учесть обработанный элемент
    pub fn record_item(&self, session_id: &str, error: Option<String>) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(progress) = sessions.get_mut(session_id) {
            progress.processed += 1;
            match error {
                Some(message) => {
                    progress.failed += 1;
                    progress.error_messages.push(message);
                }
                None => progress.succeeded += 1,
            }
            progress.updated_at = chrono::Utc::now();
        }
    }

    /// Завершить сессию с итоговым отчётом
    pub fn complete_session(&self, session_id: &str, report: BulkReport) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(progress) = sessions.get_mut(session_id) {
            progress.status = if progress.failed > 0 {
                BulkStatus::CompletedWithErrors
            } else {
                BulkStatus::Completed
            };
            progress.report = Some(report);
            progress.completed_at = Some(chrono::Utc::now());
            progress.updated_at = chrono::Utc::now();
            progress.current_item = None;
        }
    }

    /// Операция прервалась целиком
    pub fn fail_session(&self, session_id: &str, message: String) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(progress) = sessions.get_mut(session_id) {
            progress.status = BulkStatus::Failed;
            progress.error_messages.push(message);
            progress.completed_at = Some(chrono::Utc::now());
            progress.updated_at = chrono::Utc::now();
            progress.current_item = None;
        }
    }

    /// Удалить старые сессии (для очистки памяти)
    pub fn cleanup_old_sessions(&self, max_age_hours: i64) {
        let mut sessions = self.sessions.write().unwrap();
        let now = chrono::Utc::now();
        sessions.retain(|_, progress| {
            if let Some(completed_at) = progress.completed_at {
                (now - completed_at).num_hours() < max_age_hours
            } else {
                true // Не удаляем активные сессии
            }
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
