pub mod client;
pub mod token;

pub use client::ErpApiClient;
pub use token::IdempotencyToken;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::shared::directories::ErpDirectories;
use serde::Serialize;
use thiserror::Error;

/// Ошибки транспорта/протокола при обращении к ERP
#[derive(Debug, Error)]
pub enum ErpApiError {
    /// Сеть, таймаут, отказ соединения: безопасно повторить
    #[error("ERP network error: {0}")]
    Network(String),

    #[error("ERP HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("ERP response decode error: {0}")]
    Decode(String),
}

/// Данные заказа для проверки и выгрузки, ключ: составной номер
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErpOrderPayload {
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    #[serde(rename = "salesDriveOrderId")]
    pub storefront_order_id: i64,
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "paymentFormId", skip_serializing_if = "Option::is_none")]
    pub payment_form_id: Option<String>,
    #[serde(rename = "cashAccountId", skip_serializing_if = "Option::is_none")]
    pub cash_account_id: Option<String>,
    #[serde(rename = "tradeChannelId", skip_serializing_if = "Option::is_none")]
    pub trade_channel_id: Option<String>,
    #[serde(rename = "deliveryMethodId", skip_serializing_if = "Option::is_none")]
    pub delivery_method_id: Option<String>,
    /// None: фирму выбирает ERP
    #[serde(rename = "firmId", skip_serializing_if = "Option::is_none")]
    pub firm_id: Option<String>,
    #[serde(rename = "storageId", skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    #[serde(rename = "orderDate", skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(rename = "totalAmount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    pub items: serde_json::Value,
}

/// Данные для создания отгрузки по уже выгруженному заказу
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErpShipmentPayload {
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    #[serde(rename = "dilovodDocId")]
    pub erp_doc_id: String,
    #[serde(rename = "firmId", skip_serializing_if = "Option::is_none")]
    pub firm_id: Option<String>,
    #[serde(rename = "storageId", skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
}

#[derive(Debug)]
pub enum ValidateOutcome {
    /// Проверка пройдена; токен (если есть) передаётся в выгрузку
    Accepted { token: IdempotencyToken },
    /// ERP сообщает о ненастроенном сопоставлении
    CriticalConfiguration { details: String },
    Rejected { message: String },
}

#[derive(Debug)]
pub enum ExportOutcome {
    /// Идентичный документ уже есть, ничего не создано
    NoChanges,
    Created {
        doc_id: String,
        export_date: DateTime<Utc>,
        sale_token: IdempotencyToken,
    },
    Rejected { message: String },
}

#[derive(Debug)]
pub enum ShipmentOutcome {
    Created {
        date: DateTime<Utc>,
        message: String,
    },
    NotCreated { message: String },
}

/// Ссылка на найденный в ERP документ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpDocumentRef {
    pub id: String,
    pub date: Option<DateTime<Utc>>,
}

/// Что ERP знает о заказе с данным составным номером
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpDocumentLookup {
    pub order_number: String,
    pub sale_order: Option<ErpDocumentRef>,
    pub shipment_date: Option<DateTime<Utc>>,
    pub cash_in_date: Option<DateTime<Utc>>,
}

/// Граница с ERP: справочники, документы, поиск по номеру
#[async_trait]
pub trait ErpApi: Send + Sync {
    async fn fetch_directories(&self) -> Result<ErpDirectories, ErpApiError>;

    async fn validate_order(&self, payload: &ErpOrderPayload)
        -> Result<ValidateOutcome, ErpApiError>;

    /// Токен проверки передаётся по значению: он одноразовый
    async fn export_order(
        &self,
        payload: &ErpOrderPayload,
        token: IdempotencyToken,
    ) -> Result<ExportOutcome, ErpApiError>;

    /// ERP сам решает, создана ли уже отгрузка
    async fn create_shipment(
        &self,
        payload: &ErpShipmentPayload,
        token: IdempotencyToken,
    ) -> Result<ShipmentOutcome, ErpApiError>;

    /// Пакетный поиск документов по составным номерам (только чтение)
    async fn lookup_documents(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<ErpDocumentLookup>, ErpApiError>;
}
