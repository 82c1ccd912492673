use axum::{http::StatusCode, Json};
use contracts::shared::directories::{ErpDirectories, StorefrontDirectories};

use super::{app_services, error_body, HandlerError};

/// GET /api/erp/directories
pub async fn erp_directories() -> Result<Json<ErpDirectories>, HandlerError> {
    let services = app_services()?;
    services.erp.fetch_directories().await.map(Json).map_err(|e| {
        tracing::error!("Failed to fetch ERP directories: {}", e);
        error_body(StatusCode::BAD_GATEWAY, e.to_string())
    })
}

/// GET /api/storefront/directories
pub async fn storefront_directories() -> Result<Json<StorefrontDirectories>, HandlerError> {
    let services = app_services()?;
    let api = services.storefront.as_ref();

    let bad_gateway = |e: crate::shared::storefront::StorefrontApiError| {
        tracing::error!("Failed to fetch storefront directories: {}", e);
        error_body(StatusCode::BAD_GATEWAY, e.to_string())
    };

    Ok(Json(StorefrontDirectories {
        payment_methods: api.fetch_payment_methods().await.map_err(bad_gateway)?,
        statuses: api.fetch_order_statuses().await.map_err(bad_gateway)?,
        shipping_methods: api.fetch_shipping_methods().await.map_err(bad_gateway)?,
        sales_channels: api.fetch_sales_channels().await.map_err(bad_gateway)?,
    }))
}
