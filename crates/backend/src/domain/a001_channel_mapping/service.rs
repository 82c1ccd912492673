use super::repository::SettingsStore;
use super::validator::{is_cash_form_id, MappingValidator};
use chrono::Utc;
use contracts::domain::a001_channel_mapping::aggregate::{
    ChannelMapping, DeliveryMapping, MappingEdit, MappingSettings, PaymentMapping,
};
use contracts::shared::directories::ErpDirectories;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

/// Отказ в применении правки; настройки при этом не меняются
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingEditError {
    #[error("channelId must not be empty")]
    EmptyChannelId,

    #[error("Mapping channelId '{mapping_channel_id}' does not match channel '{channel_id}'")]
    ChannelMismatch {
        channel_id: String,
        mapping_channel_id: String,
    },

    #[error("Payment method {method} is already mapped in channel {channel_id} (mapping {existing_mapping_id})")]
    DuplicatePaymentMethod {
        channel_id: String,
        method: i64,
        existing_mapping_id: String,
    },

    #[error("Mapping id '{0}' already exists")]
    DuplicateMappingId(String),

    #[error("Channel '{0}' has no mappings")]
    ChannelNotFound(String),

    #[error("Mapping '{mapping_id}' not found in channel '{channel_id}'")]
    MappingNotFound {
        channel_id: String,
        mapping_id: String,
    },
}

#[derive(Debug, Error)]
pub enum MappingServiceError {
    #[error(transparent)]
    Rejected(#[from] MappingEditError),

    #[error("Settings storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// `mapping_<unix millis>_<9 символов [a-z0-9]>`
pub fn generate_mapping_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("mapping_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Префикс и суффикс входят в номер ERP как есть, пробелы значимы
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Подготовить сопоставление к записи в канал: channelId, id, пустые поля,
/// счёт для наличной формы оплаты
fn prepare_mapping(
    channel_id: &str,
    mut mapping: PaymentMapping,
    directories: Option<&ErpDirectories>,
) -> Result<PaymentMapping, MappingEditError> {
    if mapping.channel_id.is_empty() {
        mapping.channel_id = channel_id.to_string();
    } else if mapping.channel_id != channel_id {
        return Err(MappingEditError::ChannelMismatch {
            channel_id: channel_id.to_string(),
            mapping_channel_id: mapping.channel_id,
        });
    }

    mapping.payment_form = normalize(mapping.payment_form);
    mapping.cash_account = normalize(mapping.cash_account);

    if let Some(dirs) = directories {
        if mapping.cash_account.is_some() && is_cash_form_id(mapping.payment_form.as_deref(), dirs) {
            tracing::debug!(
                "Clearing cash account of mapping {}: payment form is cash",
                mapping.id
            );
            mapping.cash_account = None;
        }
    }
    Ok(mapping)
}

fn check_payment_method_free(
    settings: &MappingSettings,
    channel_id: &str,
    mapping: &PaymentMapping,
    exclude_mapping_id: Option<&str>,
) -> Result<(), MappingEditError> {
    let Some(method) = mapping.sales_drive_payment_method else {
        return Ok(());
    };
    let validator = MappingValidator::new(settings);
    if validator.is_sales_drive_payment_method_used(method, channel_id, exclude_mapping_id) {
        let existing_mapping_id = settings
            .channel(channel_id)
            .and_then(|c| {
                c.mappings
                    .iter()
                    .find(|m| {
                        m.sales_drive_payment_method == Some(method)
                            && Some(m.id.as_str()) != exclude_mapping_id
                    })
                    .map(|m| m.id.clone())
            })
            .unwrap_or_default();
        return Err(MappingEditError::DuplicatePaymentMethod {
            channel_id: channel_id.to_string(),
            method,
            existing_mapping_id,
        });
    }
    Ok(())
}

/// Применить одну правку к настройкам.
///
/// Чистая функция: возвращает новые настройки или ошибку, исходные не
/// меняются. Справочники ERP нужны только для очистки денежного счёта
/// у наличных форм оплаты; без них счёт сохраняется как есть.
pub fn apply_edit(
    settings: &MappingSettings,
    edit: MappingEdit,
    directories: Option<&ErpDirectories>,
) -> Result<MappingSettings, MappingEditError> {
    let mut next = settings.clone();

    match edit {
        MappingEdit::AddPaymentMapping {
            channel_id,
            mut mapping,
        } => {
            if channel_id.trim().is_empty() {
                return Err(MappingEditError::EmptyChannelId);
            }
            if mapping.id.trim().is_empty() {
                mapping.id = generate_mapping_id();
            }
            let mapping = prepare_mapping(&channel_id, mapping, directories)?;

            if next
                .channel_payment_mapping
                .values()
                .any(|c| c.find_by_id(&mapping.id).is_some())
            {
                return Err(MappingEditError::DuplicateMappingId(mapping.id));
            }
            check_payment_method_free(settings, &channel_id, &mapping, None)?;

            next.channel_payment_mapping
                .entry(channel_id.clone())
                .or_insert_with(|| ChannelMapping::new(channel_id))
                .mappings
                .push(mapping);
        }

        MappingEdit::UpdatePaymentMapping {
            channel_id,
            mapping,
        } => {
            let mapping = prepare_mapping(&channel_id, mapping, directories)?;
            check_payment_method_free(settings, &channel_id, &mapping, Some(&mapping.id))?;

            let channel = next
                .channel_payment_mapping
                .get_mut(&channel_id)
                .ok_or_else(|| MappingEditError::ChannelNotFound(channel_id.clone()))?;
            let slot = channel
                .mappings
                .iter_mut()
                .find(|m| m.id == mapping.id)
                .ok_or_else(|| MappingEditError::MappingNotFound {
                    channel_id: channel_id.clone(),
                    mapping_id: mapping.id.clone(),
                })?;
            *slot = mapping;
        }

        MappingEdit::RemovePaymentMapping {
            channel_id,
            mapping_id,
        } => {
            let channel = next
                .channel_payment_mapping
                .get_mut(&channel_id)
                .ok_or_else(|| MappingEditError::ChannelNotFound(channel_id.clone()))?;
            let before = channel.mappings.len();
            channel.mappings.retain(|m| m.id != mapping_id);
            if channel.mappings.len() == before {
                return Err(MappingEditError::MappingNotFound {
                    channel_id,
                    mapping_id,
                });
            }
            // канал без сопоставлений не хранится
            if channel.mappings.is_empty() {
                next.channel_payment_mapping.remove(&channel_id);
            }
        }

        MappingEdit::SetChannelOptions {
            channel_id,
            prefix_order,
            sufix_order,
            erp_trade_channel_id,
        } => {
            let channel = next
                .channel_payment_mapping
                .get_mut(&channel_id)
                .ok_or_else(|| MappingEditError::ChannelNotFound(channel_id.clone()))?;
            channel.prefix_order = non_empty(prefix_order);
            channel.sufix_order = non_empty(sufix_order);
            channel.erp_trade_channel_id = normalize(erp_trade_channel_id);
        }

        MappingEdit::SetDeliveryMappings { delivery_mappings } => {
            next.delivery_mappings = delivery_mappings
                .into_iter()
                .map(|dm| DeliveryMapping {
                    sales_drive_shipping_methods: dm
                        .sales_drive_shipping_methods
                        .into_iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                    erp_delivery_method_id: normalize(dm.erp_delivery_method_id),
                })
                .collect();
        }

        MappingEdit::SetDefaults {
            default_firm_id,
            storage_id,
        } => {
            next.default_firm_id = normalize(default_firm_id);
            next.storage_id = normalize(storage_id);
        }
    }

    Ok(next)
}

/// Загрузить, применить правку, сохранить
pub async fn edit(
    store: &dyn SettingsStore,
    edit: MappingEdit,
    directories: Option<&ErpDirectories>,
) -> Result<MappingSettings, MappingServiceError> {
    let current = store.load().await?;
    let next = apply_edit(&current, edit, directories).map_err(|e| {
        tracing::warn!("Mapping edit rejected: {}", e);
        e
    })?;
    store.save(&next).await?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::InMemorySettingsStore;
    use contracts::shared::directories::{CashAccount, PaymentForm};

    fn payment(id: &str, method: Option<i64>) -> PaymentMapping {
        let mut m = PaymentMapping::new(id.to_string(), "22".to_string());
        m.sales_drive_payment_method = method;
        m
    }

    fn add(channel_id: &str, mapping: PaymentMapping) -> MappingEdit {
        MappingEdit::AddPaymentMapping {
            channel_id: channel_id.to_string(),
            mapping,
        }
    }

    #[test]
    fn test_generate_mapping_id_format() {
        let id = generate_mapping_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "mapping");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_add_creates_channel_and_generates_id() {
        let settings = MappingSettings::default();
        let next = apply_edit(&settings, add("22", payment("", Some(5))), None).unwrap();
        let channel = next.channel("22").unwrap();
        assert_eq!(channel.mappings.len(), 1);
        assert!(channel.mappings[0].id.starts_with("mapping_"));
        assert_eq!(channel.mappings[0].channel_id, "22");
        // исходные настройки не тронуты
        assert!(settings.channel_payment_mapping.is_empty());
    }

    #[test]
    fn test_duplicate_payment_method_rejected() {
        let settings = apply_edit(
            &MappingSettings::default(),
            add("22", payment("m1", Some(5))),
            None,
        )
        .unwrap();

        let err = apply_edit(&settings, add("22", payment("m2", Some(5))), None).unwrap_err();
        assert_eq!(
            err,
            MappingEditError::DuplicatePaymentMethod {
                channel_id: "22".into(),
                method: 5,
                existing_mapping_id: "m1".into(),
            }
        );

        // the same method in another channel is fine
        let mut other = payment("m3", Some(5));
        other.channel_id = "23".into();
        assert!(apply_edit(&settings, add("23", other), None).is_ok());
    }

    #[test]
    fn test_update_may_keep_its_own_method() {
        let settings = apply_edit(
            &MappingSettings::default(),
            add("22", payment("m1", Some(5))),
            None,
        )
        .unwrap();
        let mut updated = payment("m1", Some(5));
        updated.payment_form = Some("card-form".into());
        let next = apply_edit(
            &settings,
            MappingEdit::UpdatePaymentMapping {
                channel_id: "22".into(),
                mapping: updated,
            },
            None,
        )
        .unwrap();
        assert_eq!(
            next.channel("22").unwrap().mappings[0].payment_form.as_deref(),
            Some("card-form")
        );
    }

    #[test]
    fn test_channel_mismatch_rejected() {
        let err = apply_edit(&MappingSettings::default(), add("23", payment("m1", Some(5))), None)
            .unwrap_err();
        assert!(matches!(err, MappingEditError::ChannelMismatch { .. }));
    }

    #[test]
    fn test_removing_last_mapping_drops_channel() {
        let settings = apply_edit(
            &MappingSettings::default(),
            add("22", payment("m1", Some(5))),
            None,
        )
        .unwrap();
        let next = apply_edit(
            &settings,
            MappingEdit::RemovePaymentMapping {
                channel_id: "22".into(),
                mapping_id: "m1".into(),
            },
            None,
        )
        .unwrap();
        assert!(next.channel("22").is_none());
    }

    #[test]
    fn test_channel_options_need_existing_channel() {
        let edit = MappingEdit::SetChannelOptions {
            channel_id: "22".into(),
            prefix_order: Some("RZ-".into()),
            sufix_order: Some("".into()),
            erp_trade_channel_id: None,
        };
        assert_eq!(
            apply_edit(&MappingSettings::default(), edit.clone(), None).unwrap_err(),
            MappingEditError::ChannelNotFound("22".into())
        );

        let settings = apply_edit(
            &MappingSettings::default(),
            add("22", payment("m1", Some(5))),
            None,
        )
        .unwrap();
        let next = apply_edit(&settings, edit, None).unwrap();
        assert_eq!(next.compose_order_number("22", "9386"), "RZ-9386");
        assert_eq!(next.channel("22").unwrap().sufix_order, None);
    }

    #[test]
    fn test_channel_options_keep_whitespace() {
        let settings = apply_edit(
            &MappingSettings::default(),
            add("22", payment("m1", Some(5))),
            None,
        )
        .unwrap();
        let next = apply_edit(
            &settings,
            MappingEdit::SetChannelOptions {
                channel_id: "22".into(),
                prefix_order: Some("RZ ".into()),
                sufix_order: Some(" /K".into()),
                erp_trade_channel_id: Some(" ".into()),
            },
            None,
        )
        .unwrap();
        assert_eq!(next.compose_order_number("22", "9386"), "RZ 9386 /K");
        assert_eq!(next.channel("22").unwrap().erp_trade_channel_id, None);
    }

    #[test]
    fn test_cash_form_clears_cash_account() {
        let dirs = ErpDirectories {
            payment_forms: vec![PaymentForm {
                id: "cash-form-1".into(),
                name: "Готівка".into(),
            }],
            cash_accounts: vec![CashAccount {
                id: "acc-1".into(),
                name: "Каса".into(),
                owner: None,
            }],
            ..Default::default()
        };
        let mut m = payment("m1", Some(5));
        m.payment_form = Some("cash-form-1".into());
        m.cash_account = Some("acc-1".into());

        let next = apply_edit(&MappingSettings::default(), add("22", m), Some(&dirs)).unwrap();
        assert_eq!(next.channel("22").unwrap().mappings[0].cash_account, None);
    }

    #[tokio::test]
    async fn test_edit_persists_and_rejects() {
        let store = InMemorySettingsStore::default();
        edit(&store, add("22", payment("m1", Some(5))), None)
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().channel("22").unwrap().mappings.len(), 1);

        let result = edit(&store, add("22", payment("m2", Some(5))), None).await;
        assert!(matches!(result, Err(MappingServiceError::Rejected(_))));
        assert_eq!(store.load().await.unwrap().channel("22").unwrap().mappings.len(), 1);
    }
}
