use axum::{extract::Path, http::StatusCode, Json};
use contracts::usecases::u501_export_to_erp::{
    BulkProgress, BulkReport, BulkRequest, BulkStartResponse, ExportErrorKind, ExportOrderRequest,
    OrderRunReport,
};
use contracts::usecases::u502_reconcile_with_erp::{ReconcileRequest, ReconcileResponse};

use super::{app_services, error_body, HandlerError};
use crate::usecases::u502_reconcile_with_erp::ReconcileError;

/// HTTP-статус отчёта о выгрузке: тело всегда содержит сам отчёт
pub fn report_status(report: &OrderRunReport) -> StatusCode {
    let Some(first) = report.errors.first() else {
        return StatusCode::OK;
    };
    match first.kind {
        ExportErrorKind::CriticalConfiguration => StatusCode::UNPROCESSABLE_ENTITY,
        ExportErrorKind::Network => StatusCode::BAD_GATEWAY,
        ExportErrorKind::AlreadyInProgress => StatusCode::CONFLICT,
        ExportErrorKind::OrderNotFound => StatusCode::NOT_FOUND,
        ExportErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        ExportErrorKind::RecoverableValidation
        | ExportErrorKind::Export
        | ExportErrorKind::Shipment => StatusCode::OK,
    }
}

// ============================================================================
// UseCase u501: Export to ERP
// ============================================================================

/// POST /api/u501/orders/:id/export
pub async fn u501_export_order(
    Path(order_id): Path<i64>,
    Json(request): Json<ExportOrderRequest>,
) -> Result<(StatusCode, Json<OrderRunReport>), HandlerError> {
    let services = app_services()?;
    let report = services
        .bulk
        .orchestrator()
        .run(order_id, request.with_shipment)
        .await;
    Ok((report_status(&report), Json(report)))
}

/// POST /api/u501/bulk/run
pub async fn u501_run_bulk(Json(request): Json<BulkRequest>) -> Result<Json<BulkReport>, HandlerError> {
    let services = app_services()?;
    Ok(Json(services.bulk.run_bulk(&request).await))
}

/// POST /api/u501/bulk/start
pub async fn u501_start_bulk(
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkStartResponse>, HandlerError> {
    let services = app_services()?;
    match services.bulk.start_bulk(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Failed to start bulk operation: {}", e);
            Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/u501/bulk/:session_id/progress
pub async fn u501_get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<BulkProgress>, HandlerError> {
    let services = app_services()?;
    match services.bulk.get_progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(error_body(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        )),
    }
}

// ============================================================================
// UseCase u502: Reconcile with ERP
// ============================================================================

/// POST /api/u502/reconcile
pub async fn u502_reconcile(
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, HandlerError> {
    let services = app_services()?;
    let result = services
        .bulk
        .reconciler()
        .reconcile_request(&request.order_ids, &request.order_numbers)
        .await;
    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Reconcile failed: {}", e);
            let status = match e {
                ReconcileError::Network(_) | ReconcileError::Erp(_) => StatusCode::BAD_GATEWAY,
                ReconcileError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(error_body(status, e.to_string()))
        }
    }
}
