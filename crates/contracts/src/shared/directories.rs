//! Справочники ERP и витрины, которые загружаются независимо от настроек
//! и могут устаревать относительно сохранённых сопоставлений.

use serde::{Deserialize, Serialize};

// ============================================================================
// ERP
// ============================================================================

/// Форма оплаты ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub id: String,
    pub name: String,
}

/// Денежный счёт ERP; owner: фирма-владелец счёта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Канал продаж ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeChannel {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Представление записи в ERP
    #[serde(rename = "id__pr", default)]
    pub presentation: String,
}

/// Способ доставки ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMethod {
    pub id: String,
    #[serde(rename = "id__pr", default)]
    pub presentation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firm {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Все справочники ERP, нужные для сопоставлений
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpDirectories {
    #[serde(rename = "paymentForms", default)]
    pub payment_forms: Vec<PaymentForm>,
    #[serde(rename = "cashAccounts", default)]
    pub cash_accounts: Vec<CashAccount>,
    #[serde(rename = "tradeChannels", default)]
    pub trade_channels: Vec<TradeChannel>,
    #[serde(rename = "deliveryMethods", default)]
    pub delivery_methods: Vec<DeliveryMethod>,
    #[serde(default)]
    pub firms: Vec<Firm>,
    #[serde(default)]
    pub storages: Vec<Storage>,
}

impl ErpDirectories {
    pub fn payment_form(&self, id: &str) -> Option<&PaymentForm> {
        self.payment_forms.iter().find(|f| f.id == id)
    }

    pub fn cash_account(&self, id: &str) -> Option<&CashAccount> {
        self.cash_accounts.iter().find(|a| a.id == id)
    }

    pub fn has_trade_channel(&self, id: &str) -> bool {
        self.trade_channels.iter().any(|c| c.id == id)
    }

    pub fn has_delivery_method(&self, id: &str) -> bool {
        self.delivery_methods.iter().any(|d| d.id == id)
    }

    pub fn has_firm(&self, id: &str) -> bool {
        self.firms.iter().any(|f| f.id == id)
    }
}

// ============================================================================
// Storefront
// ============================================================================

/// Способ оплаты витрины
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontPaymentMethod {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontOrderStatus {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontShippingMethod {
    pub name: String,
}

/// Канал продаж (сайт) витрины
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSalesChannel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontDirectories {
    #[serde(rename = "paymentMethods", default)]
    pub payment_methods: Vec<StorefrontPaymentMethod>,
    #[serde(default)]
    pub statuses: Vec<StorefrontOrderStatus>,
    #[serde(rename = "shippingMethods", default)]
    pub shipping_methods: Vec<StorefrontShippingMethod>,
    #[serde(rename = "salesChannels", default)]
    pub sales_channels: Vec<StorefrontSalesChannel>,
}
