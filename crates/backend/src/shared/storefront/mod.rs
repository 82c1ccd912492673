pub mod client;

pub use client::StorefrontApiClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::domain::a002_sales_order::aggregate::SalesOrder;
use contracts::shared::directories::{
    StorefrontOrderStatus, StorefrontPaymentMethod, StorefrontSalesChannel,
    StorefrontShippingMethod,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontApiError {
    #[error("Storefront network error: {0}")]
    Network(String),

    #[error("Storefront HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Storefront response decode error: {0}")]
    Decode(String),
}

/// Граница с витриной (CRM): справочники и заказы, только чтение
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn fetch_payment_methods(&self)
        -> Result<Vec<StorefrontPaymentMethod>, StorefrontApiError>;

    async fn fetch_order_statuses(&self) -> Result<Vec<StorefrontOrderStatus>, StorefrontApiError>;

    async fn fetch_shipping_methods(
        &self,
    ) -> Result<Vec<StorefrontShippingMethod>, StorefrontApiError>;

    async fn fetch_sales_channels(&self) -> Result<Vec<StorefrontSalesChannel>, StorefrontApiError>;

    /// Заказы, изменённые начиная с `updated_from` (все, если None)
    async fn fetch_orders(
        &self,
        updated_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesOrder>, StorefrontApiError>;
}
