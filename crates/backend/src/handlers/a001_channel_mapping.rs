use axum::{extract::Query, http::StatusCode, Json};
use contracts::domain::a001_channel_mapping::aggregate::{MappingEdit, MappingSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{app_services, error_body, HandlerError};
use crate::domain::a001_channel_mapping::validator::{
    CashAccountConflict, DeliveryConflict, DuplicatePaymentMethod, StaleReference,
};
use crate::domain::a001_channel_mapping::{service, MappingServiceError, MappingValidator};

/// GET /api/erp/mapping
pub async fn get_settings() -> Result<Json<MappingSettings>, HandlerError> {
    let services = app_services()?;
    services.settings.load().await.map(Json).map_err(|e| {
        tracing::error!("Failed to load mapping settings: {}", e);
        error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// POST /api/erp/mapping/edit
pub async fn apply_edit(
    Json(edit): Json<MappingEdit>,
) -> Result<Json<MappingSettings>, HandlerError> {
    let services = app_services()?;

    // без справочников правка всё равно применяется, только счёт
    // у наличной формы оплаты не очищается
    let directories = match services.erp.fetch_directories().await {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!("ERP directories unavailable while editing mappings: {}", e);
            None
        }
    };

    match service::edit(services.settings.as_ref(), edit, directories.as_ref()).await {
        Ok(settings) => Ok(Json(settings)),
        Err(MappingServiceError::Rejected(e)) => {
            Err(error_body(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(MappingServiceError::Storage(e)) => {
            tracing::error!("Failed to save mapping settings: {}", e);
            Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[derive(Deserialize)]
pub struct UsageParams {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "excludeMappingId")]
    pub exclude_mapping_id: Option<String>,
}

#[derive(Serialize)]
pub struct UsageResponse {
    #[serde(rename = "paymentForms")]
    pub payment_forms: BTreeSet<String>,
    #[serde(rename = "cashAccounts")]
    pub cash_accounts: BTreeSet<String>,
    #[serde(rename = "salesDrivePaymentMethods")]
    pub sales_drive_payment_methods: BTreeSet<i64>,
}

/// GET /api/erp/mapping/usage?channelId=..&excludeMappingId=..
pub async fn get_usage(
    Query(params): Query<UsageParams>,
) -> Result<Json<UsageResponse>, HandlerError> {
    let services = app_services()?;
    let settings = services.settings.load().await.map_err(|e| {
        error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let validator = MappingValidator::new(&settings);
    let exclude = params.exclude_mapping_id.as_deref();
    Ok(Json(UsageResponse {
        payment_forms: validator.used_payment_forms(&params.channel_id, exclude),
        cash_accounts: validator.used_cash_accounts(&params.channel_id, exclude),
        sales_drive_payment_methods: validator
            .used_sales_drive_payment_methods(&params.channel_id, exclude),
    }))
}

#[derive(Serialize)]
pub struct IssuesResponse {
    #[serde(rename = "directoriesAvailable")]
    pub directories_available: bool,
    #[serde(rename = "duplicatePaymentMethods")]
    pub duplicate_payment_methods: Vec<DuplicatePaymentMethod>,
    #[serde(rename = "deliveryConflicts")]
    pub delivery_conflicts: Vec<DeliveryConflict>,
    #[serde(rename = "staleReferences")]
    pub stale_references: Vec<StaleReference>,
    #[serde(rename = "cashAccountConflicts")]
    pub cash_account_conflicts: Vec<CashAccountConflict>,
}

/// GET /api/erp/mapping/issues
pub async fn get_issues() -> Result<Json<IssuesResponse>, HandlerError> {
    let services = app_services()?;
    let settings = services.settings.load().await.map_err(|e| {
        error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let validator = MappingValidator::new(&settings);

    let mut response = IssuesResponse {
        directories_available: false,
        duplicate_payment_methods: validator.duplicate_payment_methods(),
        delivery_conflicts: validator.delivery_conflicts(),
        stale_references: Vec::new(),
        cash_account_conflicts: Vec::new(),
    };

    match services.erp.fetch_directories().await {
        Ok(directories) => {
            response.directories_available = true;
            response.stale_references = validator.stale_report(&directories);
            response.cash_account_conflicts = validator.cash_account_conflicts(&directories);
        }
        Err(e) => tracing::warn!("ERP directories unavailable, stale check skipped: {}", e),
    }

    Ok(Json(response))
}
