use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // DIRECTORIES
        // ========================================
        .route(
            "/api/erp/directories",
            get(handlers::directories::erp_directories),
        )
        .route(
            "/api/storefront/directories",
            get(handlers::directories::storefront_directories),
        )
        // ========================================
        // A001 CHANNEL MAPPING
        // ========================================
        .route(
            "/api/erp/mapping",
            get(handlers::a001_channel_mapping::get_settings),
        )
        .route(
            "/api/erp/mapping/edit",
            post(handlers::a001_channel_mapping::apply_edit),
        )
        .route(
            "/api/erp/mapping/usage",
            get(handlers::a001_channel_mapping::get_usage),
        )
        .route(
            "/api/erp/mapping/issues",
            get(handlers::a001_channel_mapping::get_issues),
        )
        // ========================================
        // A002 SALES ORDER
        // ========================================
        .route("/api/orders/sync", post(handlers::a002_sales_order::sync))
        .route("/api/orders/:id", get(handlers::a002_sales_order::get_by_id))
        // ========================================
        // USECASES
        // ========================================
        .route(
            "/api/u501/orders/:id/export",
            post(handlers::usecases::u501_export_order),
        )
        .route("/api/u501/bulk/run", post(handlers::usecases::u501_run_bulk))
        .route(
            "/api/u501/bulk/start",
            post(handlers::usecases::u501_start_bulk),
        )
        .route(
            "/api/u501/bulk/:session_id/progress",
            get(handlers::usecases::u501_get_progress),
        )
        .route(
            "/api/u502/reconcile",
            post(handlers::usecases::u502_reconcile),
        )
}
