//! In-memory реализации хранилищ и внешних API для тестов

use crate::domain::a001_channel_mapping::SettingsStore;
use crate::domain::a002_sales_order::OrderStore;
use crate::shared::erp::{
    ErpApi, ErpApiError, ErpDocumentLookup, ErpDocumentRef, ErpOrderPayload, ErpShipmentPayload,
    ExportOutcome, IdempotencyToken, ShipmentOutcome, ValidateOutcome,
};
use crate::shared::storefront::{StorefrontApi, StorefrontApiError};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use contracts::domain::a001_channel_mapping::aggregate::MappingSettings;
use contracts::domain::a002_sales_order::aggregate::{OrderExportState, SalesOrder};
use contracts::shared::directories::{
    ErpDirectories, StorefrontOrderStatus, StorefrontPaymentMethod, StorefrontSalesChannel,
    StorefrontShippingMethod,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn fixed_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
}

// ============================================================================
// Stores
// ============================================================================

#[derive(Default)]
pub struct InMemorySettingsStore {
    settings: Mutex<MappingSettings>,
}

impl InMemorySettingsStore {
    pub fn with(settings: MappingSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> anyhow::Result<MappingSettings> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &MappingSettings) -> anyhow::Result<()> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<BTreeMap<i64, SalesOrder>>,
}

impl InMemoryOrderStore {
    pub fn insert(&self, order: SalesOrder) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn export_state(&self, id: i64) -> OrderExportState {
        self.orders
            .lock()
            .unwrap()
            .get(&id)
            .map(|o| o.export_state.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<SalesOrder>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<SalesOrder>> {
        Ok(self.orders.lock().unwrap().values().cloned().collect())
    }

    async fn upsert_from_storefront(&self, order: &SalesOrder) -> anyhow::Result<bool> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&order.id) {
            Some(stored) => {
                stored.refresh_from(order);
                Ok(false)
            }
            None => {
                let mut fresh = order.clone();
                fresh.export_state = OrderExportState::default();
                orders.insert(order.id, fresh);
                Ok(true)
            }
        }
    }

    async fn save_export_state(&self, id: i64, state: &OrderExportState) -> anyhow::Result<()> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Sales order {} not found", id))?;
        order.export_state = state.clone();
        Ok(())
    }
}

// ============================================================================
// ERP
// ============================================================================

#[derive(Debug, Clone)]
pub enum FakeValidate {
    Accept(Option<String>),
    Critical(String),
    Reject(String),
    Network,
}

#[derive(Debug, Clone)]
pub enum FakeExport {
    /// Новый документ, если с таким номером его ещё нет; иначе NoChanges
    Create {
        doc_id: String,
        sale_token: Option<String>,
    },
    Reject(String),
    Http(u16, String),
    Network,
}

#[derive(Debug, Clone)]
pub enum FakeShipment {
    Create,
    NotCreated(String),
    Network,
}

/// Вызов ERP в том виде, в каком его получил сервер
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErpCall {
    Directories,
    Validate { order_number: String },
    Export { order_number: String, token: Option<String> },
    Shipment { order_number: String, doc_id: String, token: Option<String> },
    Lookup { order_numbers: Vec<String> },
}

pub struct FakeErp {
    directories: Mutex<Option<ErpDirectories>>,
    validate: Mutex<BTreeMap<String, FakeValidate>>,
    export: Mutex<BTreeMap<String, FakeExport>>,
    shipment: Mutex<BTreeMap<String, FakeShipment>>,
    /// Документы, которые "существуют" в ERP, по составному номеру
    documents: Mutex<BTreeMap<String, ErpDocumentLookup>>,
    calls: Mutex<Vec<ErpCall>>,
    lookup_down: Mutex<bool>,
}

impl FakeErp {
    pub fn new(directories: ErpDirectories) -> Self {
        Self {
            directories: Mutex::new(Some(directories)),
            validate: Mutex::new(BTreeMap::new()),
            export: Mutex::new(BTreeMap::new()),
            shipment: Mutex::new(BTreeMap::new()),
            documents: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            lookup_down: Mutex::new(false),
        }
    }

    pub fn lookup_unavailable(&self) {
        *self.lookup_down.lock().unwrap() = true;
    }

    pub fn directories_unavailable(&self) {
        *self.directories.lock().unwrap() = None;
    }

    pub fn on_validate(&self, order_number: &str, mode: FakeValidate) {
        self.validate
            .lock()
            .unwrap()
            .insert(order_number.to_string(), mode);
    }

    pub fn on_export(&self, order_number: &str, mode: FakeExport) {
        self.export
            .lock()
            .unwrap()
            .insert(order_number.to_string(), mode);
    }

    pub fn on_shipment(&self, order_number: &str, mode: FakeShipment) {
        self.shipment
            .lock()
            .unwrap()
            .insert(order_number.to_string(), mode);
    }

    pub fn put_document(&self, lookup: ErpDocumentLookup) {
        self.documents
            .lock()
            .unwrap()
            .insert(lookup.order_number.clone(), lookup);
    }

    pub fn calls(&self) -> Vec<ErpCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn export_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ErpCall::Export { .. }))
            .count()
    }

    pub fn shipment_calls(&self) -> Vec<ErpCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ErpCall::Shipment { .. }))
            .collect()
    }

    fn record(&self, call: ErpCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ErpApi for FakeErp {
    async fn fetch_directories(&self) -> Result<ErpDirectories, ErpApiError> {
        self.record(ErpCall::Directories);
        self.directories
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ErpApiError::Network("connection refused".into()))
    }

    async fn validate_order(
        &self,
        payload: &ErpOrderPayload,
    ) -> Result<ValidateOutcome, ErpApiError> {
        self.record(ErpCall::Validate {
            order_number: payload.order_number.clone(),
        });
        let mode = self
            .validate
            .lock()
            .unwrap()
            .get(&payload.order_number)
            .cloned()
            .unwrap_or(FakeValidate::Accept(None));
        match mode {
            FakeValidate::Accept(token) => Ok(ValidateOutcome::Accepted {
                token: IdempotencyToken::from_option(token),
            }),
            FakeValidate::Critical(details) => Ok(ValidateOutcome::CriticalConfiguration { details }),
            FakeValidate::Reject(message) => Ok(ValidateOutcome::Rejected { message }),
            FakeValidate::Network => Err(ErpApiError::Network("timed out".into())),
        }
    }

    async fn export_order(
        &self,
        payload: &ErpOrderPayload,
        token: IdempotencyToken,
    ) -> Result<ExportOutcome, ErpApiError> {
        self.record(ErpCall::Export {
            order_number: payload.order_number.clone(),
            token: token.as_str().map(String::from),
        });
        let mode = self
            .export
            .lock()
            .unwrap()
            .get(&payload.order_number)
            .cloned()
            .unwrap_or(FakeExport::Create {
                doc_id: format!("D-{}", payload.order_number),
                sale_token: None,
            });
        match mode {
            FakeExport::Create { doc_id, sale_token } => {
                let mut documents = self.documents.lock().unwrap();
                if documents
                    .get(&payload.order_number)
                    .is_some_and(|d| d.sale_order.is_some())
                {
                    return Ok(ExportOutcome::NoChanges);
                }
                let export_date = fixed_date(19);
                documents.insert(
                    payload.order_number.clone(),
                    ErpDocumentLookup {
                        order_number: payload.order_number.clone(),
                        sale_order: Some(ErpDocumentRef {
                            id: doc_id.clone(),
                            date: Some(export_date),
                        }),
                        shipment_date: None,
                        cash_in_date: None,
                    },
                );
                Ok(ExportOutcome::Created {
                    doc_id,
                    export_date,
                    sale_token: IdempotencyToken::from_option(sale_token),
                })
            }
            FakeExport::Reject(message) => Ok(ExportOutcome::Rejected { message }),
            FakeExport::Http(status, body) => Err(ErpApiError::Http { status, body }),
            FakeExport::Network => Err(ErpApiError::Network("timed out".into())),
        }
    }

    async fn create_shipment(
        &self,
        payload: &ErpShipmentPayload,
        token: IdempotencyToken,
    ) -> Result<ShipmentOutcome, ErpApiError> {
        self.record(ErpCall::Shipment {
            order_number: payload.order_number.clone(),
            doc_id: payload.erp_doc_id.clone(),
            token: token.as_str().map(String::from),
        });
        let mode = self
            .shipment
            .lock()
            .unwrap()
            .get(&payload.order_number)
            .cloned()
            .unwrap_or(FakeShipment::Create);
        match mode {
            FakeShipment::Create => {
                let date = fixed_date(20);
                if let Some(doc) = self.documents.lock().unwrap().get_mut(&payload.order_number) {
                    doc.shipment_date = Some(date);
                }
                Ok(ShipmentOutcome::Created {
                    date,
                    message: "shipment created".into(),
                })
            }
            FakeShipment::NotCreated(message) => Ok(ShipmentOutcome::NotCreated { message }),
            FakeShipment::Network => Err(ErpApiError::Network("timed out".into())),
        }
    }

    async fn lookup_documents(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<ErpDocumentLookup>, ErpApiError> {
        self.record(ErpCall::Lookup {
            order_numbers: order_numbers.to_vec(),
        });
        if *self.lookup_down.lock().unwrap() {
            return Err(ErpApiError::Network("connection refused".into()));
        }
        let documents = self.documents.lock().unwrap();
        Ok(order_numbers
            .iter()
            .filter_map(|n| documents.get(n).cloned())
            .collect())
    }
}

// ============================================================================
// Storefront
// ============================================================================

#[derive(Default)]
pub struct FakeStorefront {
    orders: Vec<SalesOrder>,
}

impl FakeStorefront {
    pub fn with_orders(orders: Vec<SalesOrder>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn fetch_payment_methods(
        &self,
    ) -> Result<Vec<StorefrontPaymentMethod>, StorefrontApiError> {
        Ok(vec![StorefrontPaymentMethod {
            id: 5,
            name: "Накладений платіж".into(),
        }])
    }

    async fn fetch_order_statuses(&self) -> Result<Vec<StorefrontOrderStatus>, StorefrontApiError> {
        Ok(Vec::new())
    }

    async fn fetch_shipping_methods(
        &self,
    ) -> Result<Vec<StorefrontShippingMethod>, StorefrontApiError> {
        Ok(Vec::new())
    }

    async fn fetch_sales_channels(&self) -> Result<Vec<StorefrontSalesChannel>, StorefrontApiError> {
        Ok(Vec::new())
    }

    async fn fetch_orders(
        &self,
        _updated_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesOrder>, StorefrontApiError> {
        Ok(self.orders.clone())
    }
}
