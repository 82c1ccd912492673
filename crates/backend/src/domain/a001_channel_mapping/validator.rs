//! Проверки инвариантов настроек сопоставлений.
//!
//! Валидатор только отвечает на вопросы и ничего не меняет: запрет
//! дублей при редактировании делает service, устаревшие ссылки
//! показываются как предупреждения и никогда не очищаются автоматически.

use contracts::domain::a001_channel_mapping::aggregate::{
    ChannelMapping, DeliveryMapping, MappingSettings, PaymentMapping,
};
use contracts::domain::a001_channel_mapping::cash_form::is_cash_payment_form;
use contracts::shared::directories::ErpDirectories;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Вид ссылки на справочник ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StaleReferenceKind {
    PaymentForm,
    CashAccount,
    TradeChannel,
    DeliveryMethod,
}

impl StaleReferenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            StaleReferenceKind::PaymentForm => "payment form",
            StaleReferenceKind::CashAccount => "cash account",
            StaleReferenceKind::TradeChannel => "trade channel",
            StaleReferenceKind::DeliveryMethod => "delivery method",
        }
    }
}

/// Какие ссылки записи отсутствуют в текущих справочниках
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaleFlags {
    #[serde(rename = "paymentFormStale")]
    pub payment_form: bool,
    #[serde(rename = "cashAccountStale")]
    pub cash_account: bool,
    #[serde(rename = "tradeChannelStale")]
    pub trade_channel: bool,
    #[serde(rename = "deliveryMethodStale")]
    pub delivery_method: bool,
}

impl StaleFlags {
    pub fn any(&self) -> bool {
        self.payment_form || self.cash_account || self.trade_channel || self.delivery_method
    }

    pub fn kinds(&self) -> Vec<StaleReferenceKind> {
        let mut kinds = Vec::new();
        if self.payment_form {
            kinds.push(StaleReferenceKind::PaymentForm);
        }
        if self.cash_account {
            kinds.push(StaleReferenceKind::CashAccount);
        }
        if self.trade_channel {
            kinds.push(StaleReferenceKind::TradeChannel);
        }
        if self.delivery_method {
            kinds.push(StaleReferenceKind::DeliveryMethod);
        }
        kinds
    }
}

/// Устаревшая ссылка с указанием, где она хранится
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleReference {
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(rename = "mappingId", skip_serializing_if = "Option::is_none")]
    pub mapping_id: Option<String>,
    pub kind: StaleReferenceKind,
    #[serde(rename = "referencedId")]
    pub referenced_id: String,
}

/// Нарушение уникальности способа оплаты в канале (уже сохранённое)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePaymentMethod {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "salesDrivePaymentMethod")]
    pub method: i64,
    #[serde(rename = "mappingIds")]
    pub mapping_ids: Vec<String>,
}

/// Способ доставки витрины, встречающийся в нескольких DeliveryMapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryConflict {
    #[serde(rename = "shippingMethod")]
    pub shipping_method: String,
    /// Индексы записей в deliveryMappings
    pub entries: Vec<usize>,
}

/// Денежный счёт, сохранённый рядом с наличной формой оплаты
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashAccountConflict {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "mappingId")]
    pub mapping_id: String,
    #[serde(rename = "cashAccount")]
    pub cash_account: String,
}

pub struct MappingValidator<'a> {
    settings: &'a MappingSettings,
}

impl<'a> MappingValidator<'a> {
    pub fn new(settings: &'a MappingSettings) -> Self {
        Self { settings }
    }

    /// Прочие сопоставления канала (без редактируемого)
    fn others(&self, channel_id: &str, exclude_mapping_id: Option<&str>) -> Vec<&'a PaymentMapping> {
        let settings: &'a MappingSettings = self.settings;
        settings
            .channel(channel_id)
            .map(|c| {
                c.mappings
                    .iter()
                    .filter(|m| Some(m.id.as_str()) != exclude_mapping_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn used_payment_forms(
        &self,
        channel_id: &str,
        exclude_mapping_id: Option<&str>,
    ) -> BTreeSet<String> {
        self.others(channel_id, exclude_mapping_id)
            .into_iter()
            .filter_map(|m| m.payment_form.clone())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn used_cash_accounts(
        &self,
        channel_id: &str,
        exclude_mapping_id: Option<&str>,
    ) -> BTreeSet<String> {
        self.others(channel_id, exclude_mapping_id)
            .into_iter()
            .filter_map(|m| m.cash_account.clone())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn used_sales_drive_payment_methods(
        &self,
        channel_id: &str,
        exclude_mapping_id: Option<&str>,
    ) -> BTreeSet<i64> {
        self.others(channel_id, exclude_mapping_id)
            .into_iter()
            .filter_map(|m| m.sales_drive_payment_method)
            .collect()
    }

    pub fn is_sales_drive_payment_method_used(
        &self,
        method: i64,
        channel_id: &str,
        exclude_mapping_id: Option<&str>,
    ) -> bool {
        self.others(channel_id, exclude_mapping_id)
            .into_iter()
            .any(|m| m.sales_drive_payment_method == Some(method))
    }

    /// Уже сохранённые нарушения уникальности; записи не объединяются
    pub fn duplicate_payment_methods(&self) -> Vec<DuplicatePaymentMethod> {
        let mut result = Vec::new();
        for (channel_id, channel) in &self.settings.channel_payment_mapping {
            let mut by_method: BTreeMap<i64, Vec<String>> = BTreeMap::new();
            for m in &channel.mappings {
                if let Some(method) = m.sales_drive_payment_method {
                    by_method.entry(method).or_default().push(m.id.clone());
                }
            }
            for (method, mapping_ids) in by_method {
                if mapping_ids.len() > 1 {
                    result.push(DuplicatePaymentMethod {
                        channel_id: channel_id.clone(),
                        method,
                        mapping_ids,
                    });
                }
            }
        }
        result
    }

    /// Один способ доставки витрины в нескольких записях (не блокирует)
    pub fn delivery_conflicts(&self) -> Vec<DeliveryConflict> {
        let mut seen: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, dm) in self.settings.delivery_mappings.iter().enumerate() {
            let names: BTreeSet<&str> = dm
                .sales_drive_shipping_methods
                .iter()
                .map(String::as_str)
                .collect();
            for name in names {
                seen.entry(name).or_default().push(idx);
            }
        }
        seen.into_iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|(name, entries)| DeliveryConflict {
                shipping_method: name.to_string(),
                entries,
            })
            .collect()
    }

    /// Все устаревшие ссылки по всем каналам и способам доставки
    pub fn stale_report(&self, directories: &ErpDirectories) -> Vec<StaleReference> {
        let mut result = Vec::new();
        for (channel_id, channel) in &self.settings.channel_payment_mapping {
            if let Some(tc) = non_empty(&channel.erp_trade_channel_id) {
                if !directories.has_trade_channel(tc) {
                    result.push(StaleReference {
                        channel_id: Some(channel_id.clone()),
                        mapping_id: None,
                        kind: StaleReferenceKind::TradeChannel,
                        referenced_id: tc.to_string(),
                    });
                }
            }
            for m in &channel.mappings {
                let flags = is_stale(m, None, None, directories);
                for kind in flags.kinds() {
                    let referenced_id = match kind {
                        StaleReferenceKind::PaymentForm => m.payment_form.clone(),
                        StaleReferenceKind::CashAccount => m.cash_account.clone(),
                        _ => None,
                    };
                    result.push(StaleReference {
                        channel_id: Some(channel_id.clone()),
                        mapping_id: Some(m.id.clone()),
                        kind,
                        referenced_id: referenced_id.unwrap_or_default(),
                    });
                }
            }
        }
        for dm in &self.settings.delivery_mappings {
            if is_delivery_mapping_stale(dm, directories) {
                result.push(StaleReference {
                    channel_id: None,
                    mapping_id: None,
                    kind: StaleReferenceKind::DeliveryMethod,
                    referenced_id: dm.erp_delivery_method_id.clone().unwrap_or_default(),
                });
            }
        }
        result
    }

    /// Сопоставления, где при наличной форме оплаты сохранён денежный счёт
    pub fn cash_account_conflicts(&self, directories: &ErpDirectories) -> Vec<CashAccountConflict> {
        let mut result = Vec::new();
        for (channel_id, channel) in &self.settings.channel_payment_mapping {
            for m in &channel.mappings {
                let Some(cash_account) = non_empty(&m.cash_account) else {
                    continue;
                };
                if is_cash_form_id(m.payment_form.as_deref(), directories) {
                    result.push(CashAccountConflict {
                        channel_id: channel_id.clone(),
                        mapping_id: m.id.clone(),
                        cash_account: cash_account.to_string(),
                    });
                }
            }
        }
        result
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Форма оплаты с таким id есть в справочнике и классифицируется как наличная.
/// Отсутствующую в справочнике форму классифицировать нельзя, она считается не наличной.
pub fn is_cash_form_id(payment_form_id: Option<&str>, directories: &ErpDirectories) -> bool {
    payment_form_id
        .and_then(|id| directories.payment_form(id))
        .map(|f| is_cash_payment_form(&f.name))
        .unwrap_or(false)
}

/// Проверка ссылок одного сопоставления. Канал и сопоставление доставки
/// передаются, чтобы заодно проверить канал продаж и способ доставки ERP,
/// которые попадут в тот же документ.
pub fn is_stale(
    mapping: &PaymentMapping,
    channel: Option<&ChannelMapping>,
    delivery: Option<&DeliveryMapping>,
    directories: &ErpDirectories,
) -> StaleFlags {
    let payment_form = non_empty(&mapping.payment_form)
        .map(|id| directories.payment_form(id).is_none())
        .unwrap_or(false);
    let cash_account = non_empty(&mapping.cash_account)
        .map(|id| directories.cash_account(id).is_none())
        .unwrap_or(false);
    let trade_channel = channel
        .and_then(|c| non_empty(&c.erp_trade_channel_id))
        .map(|id| !directories.has_trade_channel(id))
        .unwrap_or(false);

    StaleFlags {
        payment_form,
        cash_account,
        trade_channel,
        delivery_method: delivery.is_some_and(|d| is_delivery_mapping_stale(d, directories)),
    }
}

pub fn is_delivery_mapping_stale(mapping: &DeliveryMapping, directories: &ErpDirectories) -> bool {
    non_empty(&mapping.erp_delivery_method_id)
        .map(|id| !directories.has_delivery_method(id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::directories::{CashAccount, DeliveryMethod, PaymentForm, TradeChannel};

    fn mapping(id: &str, method: Option<i64>, form: Option<&str>, account: Option<&str>) -> PaymentMapping {
        PaymentMapping {
            id: id.into(),
            channel_id: "22".into(),
            sales_drive_payment_method: method,
            payment_form: form.map(String::from),
            cash_account: account.map(String::from),
        }
    }

    fn settings(mappings: Vec<PaymentMapping>) -> MappingSettings {
        let mut channel = ChannelMapping::new("22");
        channel.mappings = mappings;
        let mut settings = MappingSettings::default();
        settings.channel_payment_mapping.insert("22".into(), channel);
        settings
    }

    fn directories() -> ErpDirectories {
        ErpDirectories {
            payment_forms: vec![
                PaymentForm { id: "cash-form-1".into(), name: "Оплата готівкою".into() },
                PaymentForm { id: "card-form".into(), name: "Оплата карткою".into() },
            ],
            cash_accounts: vec![CashAccount {
                id: "acc-1".into(),
                name: "ПриватБанк".into(),
                owner: Some("firm-1".into()),
            }],
            trade_channels: vec![TradeChannel {
                id: "tc-1".into(),
                code: None,
                presentation: "Сайт".into(),
            }],
            delivery_methods: vec![DeliveryMethod {
                id: "dm-1".into(),
                presentation: "Нова Пошта".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_used_sets_exclude_edited_mapping() {
        let s = settings(vec![
            mapping("m1", Some(5), Some("cash-form-1"), None),
            mapping("m2", Some(7), Some("card-form"), Some("acc-1")),
        ]);
        let v = MappingValidator::new(&s);

        assert_eq!(
            v.used_sales_drive_payment_methods("22", None),
            BTreeSet::from([5, 7])
        );
        assert_eq!(
            v.used_sales_drive_payment_methods("22", Some("m2")),
            BTreeSet::from([5])
        );
        assert_eq!(
            v.used_payment_forms("22", Some("m1")),
            BTreeSet::from(["card-form".to_string()])
        );
        assert_eq!(
            v.used_cash_accounts("22", None),
            BTreeSet::from(["acc-1".to_string()])
        );
        assert!(v.used_payment_forms("99", None).is_empty());
    }

    #[test]
    fn test_payment_method_used_before_insert() {
        let s = settings(vec![mapping("m1", Some(5), None, None)]);
        let v = MappingValidator::new(&s);
        assert!(v.is_sales_drive_payment_method_used(5, "22", None));
        // the mapping being edited does not conflict with itself
        assert!(!v.is_sales_drive_payment_method_used(5, "22", Some("m1")));
        assert!(!v.is_sales_drive_payment_method_used(6, "22", None));
        assert!(!v.is_sales_drive_payment_method_used(5, "23", None));
    }

    #[test]
    fn test_duplicate_payment_methods_flagged() {
        let s = settings(vec![
            mapping("m1", Some(5), None, None),
            mapping("m2", Some(5), None, None),
            mapping("m3", Some(6), None, None),
        ]);
        let dups = MappingValidator::new(&s).duplicate_payment_methods();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].method, 5);
        assert_eq!(dups[0].mapping_ids, vec!["m1".to_string(), "m2".to_string()]);
    }

    #[test]
    fn test_is_stale() {
        let dirs = directories();
        let fresh = mapping("m1", Some(5), Some("card-form"), Some("acc-1"));
        assert!(!is_stale(&fresh, None, None, &dirs).any());

        let gone = mapping("m2", Some(6), Some("deleted-form"), Some("deleted-acc"));
        let mut channel = ChannelMapping::new("22");
        channel.erp_trade_channel_id = Some("tc-old".into());
        let flags = is_stale(&gone, Some(&channel), None, &dirs);
        assert!(flags.payment_form);
        assert!(flags.cash_account);
        assert!(flags.trade_channel);
        assert!(!flags.delivery_method);

        let delivery = DeliveryMapping {
            sales_drive_shipping_methods: vec!["Укрпошта".into()],
            erp_delivery_method_id: Some("dm-old".into()),
        };
        let flags = is_stale(&fresh, None, Some(&delivery), &dirs);
        assert!(flags.delivery_method);
        assert_eq!(flags.kinds(), vec![StaleReferenceKind::DeliveryMethod]);
    }

    #[test]
    fn test_stale_report_keeps_references() {
        let mut s = settings(vec![mapping("m1", Some(5), Some("deleted-form"), None)]);
        s.delivery_mappings.push(DeliveryMapping {
            sales_drive_shipping_methods: vec!["Укрпошта".into()],
            erp_delivery_method_id: Some("dm-old".into()),
        });
        let report = MappingValidator::new(&s).stale_report(&directories());
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].kind, StaleReferenceKind::PaymentForm);
        assert_eq!(report[0].referenced_id, "deleted-form");
        assert_eq!(report[1].kind, StaleReferenceKind::DeliveryMethod);
        // report only, the stored id is still there
        assert_eq!(
            s.channel("22").unwrap().mappings[0].payment_form.as_deref(),
            Some("deleted-form")
        );
    }

    #[test]
    fn test_delivery_conflicts() {
        let mut s = MappingSettings::default();
        s.delivery_mappings = vec![
            DeliveryMapping {
                sales_drive_shipping_methods: vec!["Нова Пошта".into(), "Кур'єр".into()],
                erp_delivery_method_id: Some("dm-1".into()),
            },
            DeliveryMapping {
                sales_drive_shipping_methods: vec!["Нова Пошта".into()],
                erp_delivery_method_id: Some("dm-2".into()),
            },
        ];
        let conflicts = MappingValidator::new(&s).delivery_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].shipping_method, "Нова Пошта");
        assert_eq!(conflicts[0].entries, vec![0, 1]);
    }

    #[test]
    fn test_cash_account_conflicts() {
        let s = settings(vec![
            mapping("m1", Some(5), Some("cash-form-1"), Some("acc-1")),
            mapping("m2", Some(6), Some("card-form"), Some("acc-1")),
        ]);
        let conflicts = MappingValidator::new(&s).cash_account_conflicts(&directories());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].mapping_id, "m1");
    }
}
