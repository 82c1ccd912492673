use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::domain::a001_channel_mapping::{SettingsStore, SqliteSettingsStore};
use crate::domain::a002_sales_order::{OrderStore, SqliteOrderStore};
use crate::shared::config::Config;
use crate::shared::erp::{ErpApi, ErpApiClient};
use crate::shared::storefront::{StorefrontApi, StorefrontApiClient};
use crate::usecases::u501_export_to_erp::{BulkExecutor, ExportOrchestrator, ProgressTracker};
use crate::usecases::u502_reconcile_with_erp::ReconcileChecker;

static SERVICES: OnceCell<AppServices> = OnceCell::new();

/// Внешние API, хранилища и executors, общие для всех обработчиков
pub struct AppServices {
    pub erp: Arc<dyn ErpApi>,
    pub storefront: Arc<dyn StorefrontApi>,
    pub settings: Arc<dyn SettingsStore>,
    pub orders: Arc<dyn OrderStore>,
    pub bulk: BulkExecutor,
}

impl AppServices {
    pub fn new(
        erp: Arc<dyn ErpApi>,
        storefront: Arc<dyn StorefrontApi>,
        settings: Arc<dyn SettingsStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        let orchestrator = Arc::new(ExportOrchestrator::new(
            erp.clone(),
            orders.clone(),
            settings.clone(),
        ));
        let reconciler = Arc::new(ReconcileChecker::new(
            erp.clone(),
            orders.clone(),
            settings.clone(),
        ));
        let bulk = BulkExecutor::new(orchestrator, reconciler, Arc::new(ProgressTracker::new()));

        Self {
            erp,
            storefront,
            settings,
            orders,
            bulk,
        }
    }
}

/// Собрать сервисы по конфигурации (после инициализации БД)
pub fn initialize_services(config: &Config) -> Result<&'static AppServices> {
    let erp = ErpApiClient::new(&config.erp).context("ERP client")?;
    let storefront = StorefrontApiClient::new(&config.storefront).context("Storefront client")?;

    tracing::info!("ERP API: {}", config.erp.base_url);
    tracing::info!("Storefront API: {}", config.storefront.base_url);

    let app_services = AppServices::new(
        Arc::new(erp),
        Arc::new(storefront),
        Arc::new(SqliteSettingsStore),
        Arc::new(SqliteOrderStore),
    );

    SERVICES
        .set(app_services)
        .map_err(|_| anyhow::anyhow!("Services are already initialized"))?;
    services()
}

pub fn services() -> Result<&'static AppServices> {
    SERVICES
        .get()
        .ok_or_else(|| anyhow::anyhow!("Services have not been initialized"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::load_config;

    #[test]
    fn test_services_are_initialized_once() {
        let config = load_config().unwrap();

        let initialized = initialize_services(&config).unwrap();
        assert!(std::ptr::eq(initialized, services().unwrap()));
        assert!(initialize_services(&config).is_err());
    }
}
