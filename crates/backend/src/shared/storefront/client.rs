use super::{StorefrontApi, StorefrontApiError};
use crate::shared::config::StorefrontConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use contracts::domain::a002_sales_order::aggregate::SalesOrder;
use contracts::shared::directories::{
    StorefrontOrderStatus, StorefrontPaymentMethod, StorefrontSalesChannel,
    StorefrontShippingMethod,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// HTTP-клиент API витрины
pub struct StorefrontApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StorefrontApiClient {
    pub fn new(config: &StorefrontConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create storefront HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, StorefrontApiError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("Storefront API: GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Form-Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| StorefrontApiError::Network(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StorefrontApiError::Network(format!("reading body of {}: {}", url, e)))?;

        if !status.is_success() {
            return Err(StorefrontApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| StorefrontApiError::Decode(format!("{}: {}", url, e)))
    }
}

#[derive(Debug, Deserialize)]
struct DataWire<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Заказ в формате витрины; числовые поля иногда приходят строками
#[derive(Debug, Deserialize)]
struct OrderWire {
    id: i64,
    #[serde(rename = "externalId", default)]
    external_id: Option<serde_json::Value>,
    #[serde(rename = "orderNumber", default)]
    order_number: Option<serde_json::Value>,
    #[serde(default)]
    sajt: Option<serde_json::Value>,
    #[serde(default)]
    payment_method: Option<serde_json::Value>,
    #[serde(default)]
    shipping_method: Option<String>,
    #[serde(rename = "statusId", default)]
    status_id: Option<serde_json::Value>,
    #[serde(rename = "orderTime", default)]
    order_time: Option<String>,
    #[serde(rename = "paymentAmount", default)]
    payment_amount: Option<serde_json::Value>,
    #[serde(default)]
    products: Option<serde_json::Value>,
}

fn value_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_f64(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// "2026-10-19 12:30:00" (время витрины) или RFC 3339
fn parse_order_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn order_from_raw(raw: serde_json::Value) -> Result<SalesOrder, StorefrontApiError> {
    let wire: OrderWire = serde_json::from_value(raw.clone())
        .map_err(|e| StorefrontApiError::Decode(format!("order: {}", e)))?;

    let order_number = wire
        .order_number
        .as_ref()
        .and_then(value_to_string)
        .or_else(|| wire.external_id.as_ref().and_then(value_to_string))
        .unwrap_or_else(|| wire.id.to_string());
    let channel_id = wire
        .sajt
        .as_ref()
        .and_then(value_to_string)
        .unwrap_or_default();

    let mut order = SalesOrder::new_from_storefront(wire.id, order_number, channel_id);
    order.payment_method = wire.payment_method.as_ref().and_then(value_to_i64);
    order.shipping_method = wire.shipping_method.filter(|s| !s.trim().is_empty());
    order.status_id = wire.status_id.as_ref().and_then(value_to_i64);
    order.order_date = wire.order_time.as_deref().and_then(parse_order_time);
    order.total_amount = wire.payment_amount.as_ref().and_then(value_to_f64);
    order.items = wire.products.unwrap_or(serde_json::Value::Null);
    order.raw_data = raw;
    Ok(order)
}

#[async_trait]
impl StorefrontApi for StorefrontApiClient {
    async fn fetch_payment_methods(
        &self,
    ) -> Result<Vec<StorefrontPaymentMethod>, StorefrontApiError> {
        let wire: DataWire<StorefrontPaymentMethod> =
            self.get_json("payment-methods", &[]).await?;
        Ok(wire.data)
    }

    async fn fetch_order_statuses(&self) -> Result<Vec<StorefrontOrderStatus>, StorefrontApiError> {
        let wire: DataWire<StorefrontOrderStatus> = self.get_json("statuses", &[]).await?;
        Ok(wire.data)
    }

    async fn fetch_shipping_methods(
        &self,
    ) -> Result<Vec<StorefrontShippingMethod>, StorefrontApiError> {
        let wire: DataWire<StorefrontShippingMethod> =
            self.get_json("shipping-methods", &[]).await?;
        Ok(wire.data)
    }

    async fn fetch_sales_channels(&self) -> Result<Vec<StorefrontSalesChannel>, StorefrontApiError> {
        let wire: DataWire<StorefrontSalesChannel> = self.get_json("sales-channels", &[]).await?;
        Ok(wire.data)
    }

    async fn fetch_orders(
        &self,
        updated_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesOrder>, StorefrontApiError> {
        let mut query = Vec::new();
        if let Some(from) = updated_from {
            query.push(("updatedFrom", from.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        let wire: DataWire<serde_json::Value> = self.get_json("orders", &query).await?;

        let mut orders = Vec::with_capacity(wire.data.len());
        for raw in wire.data {
            match order_from_raw(raw) {
                Ok(order) => orders.push(order),
                Err(e) => tracing::warn!("Skipping storefront order: {}", e),
            }
        }
        tracing::info!("Storefront API: got {} orders", orders.len());
        Ok(orders)
    }
}
