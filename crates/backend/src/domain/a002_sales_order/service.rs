use super::repository::OrderStore;
use crate::domain::a001_channel_mapping::SettingsStore;
use crate::shared::storefront::StorefrontApi;
use chrono::{DateTime, Utc};
use contracts::domain::a002_sales_order::aggregate::{OrderSyncResult, SalesOrderView};

/// Подтянуть заказы из витрины. Отметки выгрузки сохранённых заказов
/// остаются без изменений.
pub async fn sync_from_storefront(
    storefront: &dyn StorefrontApi,
    store: &dyn OrderStore,
    updated_from: Option<DateTime<Utc>>,
) -> anyhow::Result<OrderSyncResult> {
    tracing::info!("Syncing storefront orders (updated from: {:?})", updated_from);

    let orders = storefront
        .fetch_orders(updated_from)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch storefront orders: {}", e))?;

    let mut result = OrderSyncResult {
        fetched: orders.len() as i32,
        ..Default::default()
    };

    for order in &orders {
        if store.upsert_from_storefront(order).await? {
            result.inserted += 1;
        } else {
            result.updated += 1;
        }
    }

    tracing::info!(
        "Storefront sync done: fetched {}, inserted {}, updated {}",
        result.fetched,
        result.inserted,
        result.updated
    );
    Ok(result)
}

/// Заказ вместе с номером, под которым его видит ERP
pub async fn get_view(
    store: &dyn OrderStore,
    settings_store: &dyn SettingsStore,
    id: i64,
) -> anyhow::Result<Option<SalesOrderView>> {
    let Some(order) = store.get_by_id(id).await? else {
        return Ok(None);
    };
    let settings = settings_store.load().await?;
    let composed_order_number = settings.compose_order_number(&order.channel_id, &order.order_number);
    Ok(Some(SalesOrderView {
        order,
        composed_order_number,
    }))
}
