use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a002_sales_order::aggregate::{OrderExportState, SalesOrder};
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_sales_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub order_number: String,
    pub channel_id: String,
    pub payment_method: Option<i64>,
    pub shipping_method: Option<String>,
    pub status_id: Option<i64>,
    pub order_date: Option<chrono::DateTime<chrono::Utc>>,
    pub total_amount: Option<f64>,
    pub items_json: String,
    pub raw_json: String,
    pub erp_doc_id: Option<String>,
    pub erp_export_date: Option<chrono::DateTime<chrono::Utc>>,
    pub erp_sale_export_date: Option<chrono::DateTime<chrono::Utc>>,
    pub erp_cash_in_date: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SalesOrder {
    fn from(m: Model) -> Self {
        let mut order = SalesOrder::new_from_storefront(m.id, m.order_number, m.channel_id);
        order.payment_method = m.payment_method;
        order.shipping_method = m.shipping_method;
        order.status_id = m.status_id;
        order.order_date = m.order_date;
        order.total_amount = m.total_amount;
        order.items = serde_json::from_str(&m.items_json).unwrap_or(serde_json::Value::Null);
        order.raw_data = serde_json::from_str(&m.raw_json).unwrap_or(serde_json::Value::Null);
        order.export_state = OrderExportState {
            erp_doc_id: m.erp_doc_id,
            erp_export_date: m.erp_export_date,
            erp_sale_export_date: m.erp_sale_export_date,
            erp_cash_in_date: m.erp_cash_in_date,
        };
        order
    }
}

/// Хранилище заказов. Отметки выгрузки пишут только оркестратор и сверка
/// через save_export_state; синхронизация с витриной их не трогает.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<SalesOrder>>;

    async fn list(&self) -> anyhow::Result<Vec<SalesOrder>>;

    /// Вставить или обновить данные витрины; true, если заказ новый
    async fn upsert_from_storefront(&self, order: &SalesOrder) -> anyhow::Result<bool>;

    async fn save_export_state(&self, id: i64, state: &OrderExportState) -> anyhow::Result<()>;
}

pub struct SqliteOrderStore;

fn conn() -> anyhow::Result<&'static DatabaseConnection> {
    get_connection()
}

fn json_text(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<SalesOrder>> {
        let result = Entity::find_by_id(id).one(conn()?).await?;
        Ok(result.map(Into::into))
    }

    async fn list(&self) -> anyhow::Result<Vec<SalesOrder>> {
        let items = Entity::find()
            .order_by_desc(Column::Id)
            .all(conn()?)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    async fn upsert_from_storefront(&self, order: &SalesOrder) -> anyhow::Result<bool> {
        let db = conn()?;
        let now = Utc::now();
        let existing = Entity::find_by_id(order.id).one(db).await?;

        match existing {
            Some(model) => {
                let version = model.version;
                let mut active: ActiveModel = model.into();
                active.order_number = Set(order.order_number.clone());
                active.channel_id = Set(order.channel_id.clone());
                active.payment_method = Set(order.payment_method);
                active.shipping_method = Set(order.shipping_method.clone());
                active.status_id = Set(order.status_id);
                active.order_date = Set(order.order_date);
                active.total_amount = Set(order.total_amount);
                active.items_json = Set(json_text(&order.items));
                active.raw_json = Set(json_text(&order.raw_data));
                active.updated_at = Set(Some(now));
                active.version = Set(version + 1);
                active.update(db).await?;
                Ok(false)
            }
            None => {
                let active = ActiveModel {
                    id: Set(order.id),
                    order_number: Set(order.order_number.clone()),
                    channel_id: Set(order.channel_id.clone()),
                    payment_method: Set(order.payment_method),
                    shipping_method: Set(order.shipping_method.clone()),
                    status_id: Set(order.status_id),
                    order_date: Set(order.order_date),
                    total_amount: Set(order.total_amount),
                    items_json: Set(json_text(&order.items)),
                    raw_json: Set(json_text(&order.raw_data)),
                    erp_doc_id: Set(None),
                    erp_export_date: Set(None),
                    erp_sale_export_date: Set(None),
                    erp_cash_in_date: Set(None),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    version: Set(0),
                };
                active.insert(db).await?;
                Ok(true)
            }
        }
    }

    async fn save_export_state(&self, id: i64, state: &OrderExportState) -> anyhow::Result<()> {
        let db = conn()?;
        let model = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Sales order {} not found", id))?;

        let version = model.version;
        let mut active: ActiveModel = model.into();
        active.erp_doc_id = Set(state.erp_doc_id.clone());
        active.erp_export_date = Set(state.erp_export_date);
        active.erp_sale_export_date = Set(state.erp_sale_export_date);
        active.erp_cash_in_date = Set(state.erp_cash_in_date);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        active.update(db).await?;

        tracing::debug!("Saved export state of order {}: {:?}", id, state);
        Ok(())
    }
}
