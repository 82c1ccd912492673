use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use contracts::domain::a002_sales_order::aggregate::{OrderSyncResult, SalesOrderView};
use serde::Deserialize;

use super::{app_services, error_body, HandlerError};
use crate::domain::a002_sales_order::service;

/// GET /api/orders/:id
pub async fn get_by_id(Path(id): Path<i64>) -> Result<Json<SalesOrderView>, HandlerError> {
    let services = app_services()?;
    match service::get_view(services.orders.as_ref(), services.settings.as_ref(), id).await {
        Ok(Some(view)) => Ok(Json(view)),
        Ok(None) => Err(error_body(
            StatusCode::NOT_FOUND,
            format!("Sales order {} not found", id),
        )),
        Err(e) => {
            tracing::error!("Failed to load order {}: {}", id, e);
            Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[derive(Deserialize)]
pub struct SyncParams {
    #[serde(rename = "updatedFrom")]
    pub updated_from: Option<DateTime<Utc>>,
}

/// POST /api/orders/sync?updatedFrom=..
pub async fn sync(Query(params): Query<SyncParams>) -> Result<Json<OrderSyncResult>, HandlerError> {
    let services = app_services()?;
    service::sync_from_storefront(
        services.storefront.as_ref(),
        services.orders.as_ref(),
        params.updated_from,
    )
    .await
    .map(Json)
    .map_err(|e| {
        tracing::error!("Storefront sync failed: {}", e);
        error_body(StatusCode::BAD_GATEWAY, e.to_string())
    })
}
