use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Payment mapping
// ============================================================================

/// Сопоставление способа оплаты витрины с формой оплаты и счётом ERP
/// в рамках одного канала продаж
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMapping {
    /// Стабильный ключ записи (`mapping_<millis>_<random>`)
    pub id: String,

    /// Обратная ссылка на канал, всегда совпадает с ключом ChannelMapping
    #[serde(rename = "channelId")]
    pub channel_id: String,

    /// Числовой id способа оплаты на витрине
    #[serde(rename = "salesDrivePaymentMethod", default, skip_serializing_if = "Option::is_none")]
    pub sales_drive_payment_method: Option<i64>,

    /// id формы оплаты в ERP
    #[serde(rename = "paymentForm", default, skip_serializing_if = "Option::is_none")]
    pub payment_form: Option<String>,

    /// id денежного счёта в ERP (пустой для наличных форм оплаты)
    #[serde(rename = "cashAccount", default, skip_serializing_if = "Option::is_none")]
    pub cash_account: Option<String>,
}

impl PaymentMapping {
    pub fn new(id: String, channel_id: String) -> Self {
        Self {
            id,
            channel_id,
            sales_drive_payment_method: None,
            payment_form: None,
            cash_account: None,
        }
    }
}

// ============================================================================
// Channel mapping
// ============================================================================

/// Настройки одного канала продаж витрины
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMapping {
    #[serde(rename = "channelId")]
    pub channel_id: String,

    #[serde(rename = "prefixOrder", default, skip_serializing_if = "Option::is_none")]
    pub prefix_order: Option<String>,

    #[serde(rename = "sufixOrder", default, skip_serializing_if = "Option::is_none")]
    pub sufix_order: Option<String>,

    /// Переопределение канала продаж ERP; None: ERP определяет сам
    #[serde(rename = "dilovodTradeChannelId", default, skip_serializing_if = "Option::is_none")]
    pub erp_trade_channel_id: Option<String>,

    /// Порядок важен только для отображения
    #[serde(default)]
    pub mappings: Vec<PaymentMapping>,
}

impl ChannelMapping {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            prefix_order: None,
            sufix_order: None,
            erp_trade_channel_id: None,
            mappings: Vec::new(),
        }
    }

    /// Номер заказа в том виде, в котором его видит и ищет ERP
    pub fn compose_order_number(&self, order_number: &str) -> String {
        format!(
            "{}{}{}",
            self.prefix_order.as_deref().unwrap_or(""),
            order_number,
            self.sufix_order.as_deref().unwrap_or("")
        )
    }

    /// Найти сопоставление по способу оплаты витрины
    pub fn find_by_payment_method(&self, method: i64) -> Option<&PaymentMapping> {
        self.mappings
            .iter()
            .find(|m| m.sales_drive_payment_method == Some(method))
    }

    pub fn find_by_id(&self, mapping_id: &str) -> Option<&PaymentMapping> {
        self.mappings.iter().find(|m| m.id == mapping_id)
    }
}

/// Составной номер заказа: префикс канала + номер витрины + суффикс канала.
/// Без настроек канала номер возвращается как есть.
pub fn compose_order_number(order_number: &str, channel: Option<&ChannelMapping>) -> String {
    match channel {
        Some(c) => c.compose_order_number(order_number),
        None => order_number.to_string(),
    }
}

// ============================================================================
// Delivery mapping
// ============================================================================

/// Несколько способов доставки витрины -> один способ доставки ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryMapping {
    #[serde(rename = "salesDriveShippingMethods", default)]
    pub sales_drive_shipping_methods: Vec<String>,

    #[serde(rename = "dilovodDeliveryMethodId", default, skip_serializing_if = "Option::is_none")]
    pub erp_delivery_method_id: Option<String>,
}

impl DeliveryMapping {
    pub fn covers(&self, shipping_method: &str) -> bool {
        self.sales_drive_shipping_methods
            .iter()
            .any(|m| m == shipping_method)
    }
}

// ============================================================================
// Settings document
// ============================================================================

/// Хранимые настройки интеграции (один JSON-документ)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MappingSettings {
    #[serde(rename = "channelPaymentMapping", default)]
    pub channel_payment_mapping: BTreeMap<String, ChannelMapping>,

    #[serde(rename = "deliveryMappings", default)]
    pub delivery_mappings: Vec<DeliveryMapping>,

    #[serde(rename = "defaultFirmId", default, skip_serializing_if = "Option::is_none")]
    pub default_firm_id: Option<String>,

    #[serde(rename = "storageId", default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
}

impl MappingSettings {
    pub fn channel(&self, channel_id: &str) -> Option<&ChannelMapping> {
        self.channel_payment_mapping.get(channel_id)
    }

    pub fn compose_order_number(&self, channel_id: &str, order_number: &str) -> String {
        compose_order_number(order_number, self.channel(channel_id))
    }

    /// Способ доставки ERP для названия способа доставки витрины
    pub fn delivery_method_for(&self, shipping_method: &str) -> Option<&str> {
        self.delivery_mappings
            .iter()
            .find(|d| d.covers(shipping_method))
            .and_then(|d| d.erp_delivery_method_id.as_deref())
    }
}

// ============================================================================
// Edit commands
// ============================================================================

/// Единственный способ изменить MappingSettings (см. backend a001 service)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MappingEdit {
    /// Добавить сопоставление; id генерируется сервером, если пустой
    AddPaymentMapping {
        #[serde(rename = "channelId")]
        channel_id: String,
        mapping: PaymentMapping,
    },
    /// Заменить сопоставление с тем же id
    UpdatePaymentMapping {
        #[serde(rename = "channelId")]
        channel_id: String,
        mapping: PaymentMapping,
    },
    RemovePaymentMapping {
        #[serde(rename = "channelId")]
        channel_id: String,
        #[serde(rename = "mappingId")]
        mapping_id: String,
    },
    /// Префикс/суффикс номера заказа и канал продаж ERP
    SetChannelOptions {
        #[serde(rename = "channelId")]
        channel_id: String,
        #[serde(rename = "prefixOrder", default)]
        prefix_order: Option<String>,
        #[serde(rename = "sufixOrder", default)]
        sufix_order: Option<String>,
        #[serde(rename = "dilovodTradeChannelId", default)]
        erp_trade_channel_id: Option<String>,
    },
    SetDeliveryMappings {
        #[serde(rename = "deliveryMappings")]
        delivery_mappings: Vec<DeliveryMapping>,
    },
    SetDefaults {
        #[serde(rename = "defaultFirmId", default)]
        default_firm_id: Option<String>,
        #[serde(rename = "storageId", default)]
        storage_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(prefix: Option<&str>, suffix: Option<&str>) -> ChannelMapping {
        let mut c = ChannelMapping::new("22");
        c.prefix_order = prefix.map(String::from);
        c.sufix_order = suffix.map(String::from);
        c
    }

    #[test]
    fn test_compose_order_number() {
        assert_eq!(
            compose_order_number("9386", Some(&channel(Some("RZ-"), Some("")))),
            "RZ-9386"
        );
        assert_eq!(
            compose_order_number("9386", Some(&channel(Some("A"), Some("/b")))),
            "A9386/b"
        );
        assert_eq!(compose_order_number("9386", Some(&channel(None, None))), "9386");
        assert_eq!(compose_order_number("9386", None), "9386");
    }

    #[test]
    fn test_settings_json_shape() {
        let json = r#"{
            "channelPaymentMapping": {
                "22": {
                    "channelId": "22",
                    "prefixOrder": "RZ-",
                    "mappings": [
                        {"id": "mapping_1_a", "channelId": "22", "salesDrivePaymentMethod": 5, "paymentForm": "cash-form-1"}
                    ]
                }
            },
            "deliveryMappings": [
                {"salesDriveShippingMethods": ["Нова Пошта"], "dilovodDeliveryMethodId": "dm-1"}
            ],
            "defaultFirmId": "firm-1"
        }"#;
        let settings: MappingSettings = serde_json::from_str(json).unwrap();
        let channel = settings.channel("22").unwrap();
        assert_eq!(channel.mappings.len(), 1);
        assert_eq!(channel.find_by_payment_method(5).unwrap().id, "mapping_1_a");
        assert_eq!(settings.compose_order_number("22", "9386"), "RZ-9386");
        assert_eq!(settings.delivery_method_for("Нова Пошта"), Some("dm-1"));
        assert_eq!(settings.delivery_method_for("Самовивіз"), None);
        assert_eq!(settings.storage_id, None);
    }

    #[test]
    fn test_edit_command_tag() {
        let json = r#"{"type":"remove_payment_mapping","channelId":"22","mappingId":"m1"}"#;
        let edit: MappingEdit = serde_json::from_str(json).unwrap();
        assert!(matches!(
            edit,
            MappingEdit::RemovePaymentMapping { ref channel_id, ref mapping_id }
                if channel_id == "22" && mapping_id == "m1"
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_compose_is_prefix_number_suffix(
            number in "[0-9A-Za-z-]{0,12}",
            prefix in "[A-Z/-]{0,4}",
            suffix in "[A-Z/-]{0,4}",
        ) {
            let c = channel(Some(&prefix), Some(&suffix));
            proptest::prop_assert_eq!(
                compose_order_number(&number, Some(&c)),
                format!("{}{}{}", prefix, number, suffix)
            );
            proptest::prop_assert_eq!(compose_order_number(&number, Some(&channel(Some(""), Some("")))), number);
        }
    }
}
