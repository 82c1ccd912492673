use super::orchestrator::ExportOrchestrator;
use super::progress_tracker::ProgressTracker;
use crate::usecases::u502_reconcile_with_erp::{ReconcileChecker, ReconcileError};
use anyhow::Result;
use contracts::enums::bulk_operation::BulkOperationKind;
use contracts::usecases::u501_export_to_erp::{
    BulkProgress, BulkReport, BulkRequest, BulkStartResponse, BulkStartStatus, OrderRunReport,
};
use contracts::usecases::u502_reconcile_with_erp::ReconcileItem;
use std::sync::Arc;
use uuid::Uuid;

/// Executor массовых операций.
///
/// Выгрузка идёт строго по одному заказу: токены ERP одноразовые и
/// привязаны к своему заказу, а ERP не обещает ничего о параллельных
/// запросах. Сверка уходит одним пакетным запросом.
#[derive(Clone)]
pub struct BulkExecutor {
    orchestrator: Arc<ExportOrchestrator>,
    reconciler: Arc<ReconcileChecker>,
    progress_tracker: Arc<ProgressTracker>,
}

fn item_error(report: &OrderRunReport) -> Option<String> {
    if report.errors.is_empty() {
        return None;
    }
    let label = if report.order_number.is_empty() {
        report.order_id.to_string()
    } else {
        report.order_number.clone()
    };
    let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
    Some(format!("{}: {}", label, messages.join("; ")))
}

impl BulkExecutor {
    pub fn new(
        orchestrator: Arc<ExportOrchestrator>,
        reconciler: Arc<ReconcileChecker>,
        progress_tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            orchestrator,
            reconciler,
            progress_tracker,
        }
    }

    pub fn orchestrator(&self) -> &ExportOrchestrator {
        &self.orchestrator
    }

    pub fn reconciler(&self) -> &ReconcileChecker {
        &self.reconciler
    }

    /// Выполнить операцию и вернуть отчёт (без сессии прогресса)
    pub async fn run_bulk(&self, request: &BulkRequest) -> BulkReport {
        match self.execute(None, request).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Bulk reconcile failed: {}", e);
                BulkReport::Reconcile {
                    items: failed_items(&request.order_ids, &e.to_string()),
                }
            }
        }
    }

    /// Запустить операцию в фоне; прогресс доступен по session_id
    pub async fn start_bulk(&self, request: BulkRequest) -> Result<BulkStartResponse> {
        tracing::info!(
            "Starting bulk {} for {} orders",
            request.operation.code(),
            request.order_ids.len()
        );

        self.progress_tracker.cleanup_old_sessions(24);

        let session_id = Uuid::new_v4().to_string();
        let total = request.order_ids.len() as i32;
        self.progress_tracker
            .create_session(session_id.clone(), request.operation, total);

        let self_clone = self.clone();
        let session_id_clone = session_id.clone();
        let operation = request.operation;

        tokio::spawn(async move {
            match self_clone.execute(Some(&session_id_clone), &request).await {
                Ok(report) => {
                    self_clone
                        .progress_tracker
                        .complete_session(&session_id_clone, report);
                    tracing::info!("Bulk session {} finished", session_id_clone);
                }
                Err(e) => {
                    tracing::error!("Bulk session {} failed: {}", session_id_clone, e);
                    self_clone
                        .progress_tracker
                        .fail_session(&session_id_clone, e.to_string());
                }
            }
        });

        Ok(BulkStartResponse {
            session_id,
            status: BulkStartStatus::Started,
            message: format!("{} запущена для {} заказов", operation.display_name(), total),
        })
    }

    /// Получить текущий прогресс
    pub fn get_progress(&self, session_id: &str) -> Option<BulkProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    /// Ошибка означает, что операция не выполнилась целиком
    async fn execute(
        &self,
        session_id: Option<&str>,
        request: &BulkRequest,
    ) -> Result<BulkReport, ReconcileError> {
        Ok(match request.operation {
            BulkOperationKind::ExportAndShip => BulkReport::ExportAndShip {
                items: self.export_and_ship(session_id, &request.order_ids).await,
            },
            BulkOperationKind::Reconcile => BulkReport::Reconcile {
                items: self.reconcile(session_id, &request.order_ids).await?,
            },
        })
    }

    async fn export_and_ship(&self, session_id: Option<&str>, order_ids: &[i64]) -> Vec<OrderRunReport> {
        let mut items = Vec::with_capacity(order_ids.len());

        for &order_id in order_ids {
            if let Some(sid) = session_id {
                self.progress_tracker
                    .set_current_item(sid, Some(order_id.to_string()));
            }

            // ошибка заказа остаётся в его отчёте, пакет продолжается
            let report = self.orchestrator.run(order_id, true).await;

            if let Some(sid) = session_id {
                self.progress_tracker.record_item(sid, item_error(&report));
            }
            items.push(report);
        }

        let failed = items.iter().filter(|r| !r.errors.is_empty()).count();
        tracing::info!(
            "Bulk export done: {} orders, {} with errors",
            items.len(),
            failed
        );
        items
    }

    async fn reconcile(
        &self,
        session_id: Option<&str>,
        order_ids: &[i64],
    ) -> Result<Vec<ReconcileItem>, ReconcileError> {
        // сверка одним запросом: при его сбое не выполнено ничего
        let items = self.reconciler.reconcile(order_ids).await?.data;

        if let Some(sid) = session_id {
            for item in &items {
                let error = item
                    .error
                    .as_ref()
                    .map(|e| format!("{}: {}", item.order_id.unwrap_or_default(), e));
                self.progress_tracker.record_item(sid, error);
            }
        }
        Ok(items)
    }
}

fn failed_items(order_ids: &[i64], message: &str) -> Vec<ReconcileItem> {
    order_ids
        .iter()
        .map(|&id| ReconcileItem {
            order_id: Some(id),
            order_number: String::new(),
            found: false,
            updated_count: 0,
            updated_fields: Vec::new(),
            error: Some(message.to_string()),
        })
        .collect()
}
