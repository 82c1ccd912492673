use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Export state
// ============================================================================

/// Состояние выгрузки заказа в ERP.
///
/// Три отметки независимы: отгрузка может существовать без оплаты,
/// и ни одна отметка не выводится из другой.
/// Меняется только оркестратором выгрузки и сверкой с ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderExportState {
    /// id документа "Заказ покупателя" в ERP
    #[serde(rename = "dilovodDocId", default, skip_serializing_if = "Option::is_none")]
    pub erp_doc_id: Option<String>,

    #[serde(rename = "dilovodExportDate", default, skip_serializing_if = "Option::is_none")]
    pub erp_export_date: Option<DateTime<Utc>>,

    /// Дата создания документа отгрузки
    #[serde(rename = "dilovodSaleExportDate", default, skip_serializing_if = "Option::is_none")]
    pub erp_sale_export_date: Option<DateTime<Utc>>,

    /// Дата документа поступления оплаты
    #[serde(rename = "dilovodCashInDate", default, skip_serializing_if = "Option::is_none")]
    pub erp_cash_in_date: Option<DateTime<Utc>>,
}

impl OrderExportState {
    /// Заказ уже выгружен (есть документ заказа в ERP)
    pub fn is_exported(&self) -> bool {
        self.erp_doc_id.is_some()
    }

    pub fn is_shipped(&self) -> bool {
        self.erp_sale_export_date.is_some()
    }

    pub fn is_paid(&self) -> bool {
        self.erp_cash_in_date.is_some()
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Заказ витрины вместе с отметками о выгрузке в ERP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    /// id заказа на витрине
    pub id: i64,

    /// Номер заказа на витрине (без префикса/суффикса канала)
    #[serde(rename = "orderNumber")]
    pub order_number: String,

    /// id канала продаж (сайта) витрины
    #[serde(rename = "sajt")]
    pub channel_id: String,

    #[serde(rename = "paymentMethod", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<i64>,

    /// Название способа доставки витрины
    #[serde(rename = "shippingMethod", default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,

    #[serde(rename = "statusId", default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,

    #[serde(rename = "orderDate", default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,

    #[serde(rename = "totalAmount", default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,

    /// Позиции заказа в формате витрины
    #[serde(default)]
    pub items: serde_json::Value,

    /// Исходный ответ витрины
    #[serde(rename = "rawData", default)]
    pub raw_data: serde_json::Value,

    #[serde(flatten)]
    pub export_state: OrderExportState,
}

impl SalesOrder {
    /// Новый заказ из витрины: состояние выгрузки всегда пустое
    pub fn new_from_storefront(id: i64, order_number: String, channel_id: String) -> Self {
        Self {
            id,
            order_number,
            channel_id,
            payment_method: None,
            shipping_method: None,
            status_id: None,
            order_date: None,
            total_amount: None,
            items: serde_json::Value::Null,
            raw_data: serde_json::Value::Null,
            export_state: OrderExportState::default(),
        }
    }

    /// Обновить данные заказа из витрины, не трогая состояние выгрузки
    pub fn refresh_from(&mut self, fresh: &SalesOrder) {
        self.order_number = fresh.order_number.clone();
        self.channel_id = fresh.channel_id.clone();
        self.payment_method = fresh.payment_method;
        self.shipping_method = fresh.shipping_method.clone();
        self.status_id = fresh.status_id;
        self.order_date = fresh.order_date;
        self.total_amount = fresh.total_amount;
        self.items = fresh.items.clone();
        self.raw_data = fresh.raw_data.clone();
    }
}

/// Заказ + номер, под которым он известен в ERP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrderView {
    #[serde(flatten)]
    pub order: SalesOrder,
    #[serde(rename = "composedOrderNumber")]
    pub composed_order_number: String,
}

/// Итог синхронизации заказов из витрины
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSyncResult {
    pub fetched: i32,
    pub inserted: i32,
    pub updated: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_keeps_export_state() {
        let mut stored = SalesOrder::new_from_storefront(1, "9386".into(), "22".into());
        stored.export_state.erp_doc_id = Some("D1".into());

        let mut fresh = SalesOrder::new_from_storefront(1, "9386".into(), "22".into());
        fresh.status_id = Some(4);
        fresh.payment_method = Some(5);

        stored.refresh_from(&fresh);
        assert_eq!(stored.status_id, Some(4));
        assert_eq!(stored.payment_method, Some(5));
        assert_eq!(stored.export_state.erp_doc_id.as_deref(), Some("D1"));
    }

    #[test]
    fn test_export_state_wire_names() {
        let json = r#"{"id":7,"orderNumber":"100","sajt":"22","dilovodDocId":"D7"}"#;
        let order: SalesOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.channel_id, "22");
        assert!(order.export_state.is_exported());
        assert!(!order.export_state.is_shipped());
        assert!(!order.export_state.is_paid());
    }
}
