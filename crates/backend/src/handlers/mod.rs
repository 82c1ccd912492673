pub mod a001_channel_mapping;
pub mod a002_sales_order;
pub mod directories;
pub mod usecases;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::system::initialization::{services, AppServices};

/// Ошибка обработчика: статус и JSON с сообщением
pub type HandlerError = (StatusCode, Json<Value>);

pub fn error_body(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (status, Json(json!({ "error": message.into() })))
}

pub fn app_services() -> Result<&'static AppServices, HandlerError> {
    services().map_err(|e| {
        tracing::error!("{}", e);
        error_body(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })
}
