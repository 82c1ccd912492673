//! Разрешение настроек для конкретного заказа: какие id ERP подставить
//! в документ и от имени какой фирмы.

use super::validator::{is_cash_form_id, is_stale, StaleReferenceKind};
use contracts::domain::a001_channel_mapping::aggregate::MappingSettings;
use contracts::domain::a002_sales_order::aggregate::SalesOrder;
use contracts::shared::directories::ErpDirectories;
use std::fmt;
use thiserror::Error;

/// Откуда взята фирма документа
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmResolution {
    /// Владелец выбранного денежного счёта
    Account(String),
    /// defaultFirmId из настроек
    Default(String),
    /// ERP выбирает фирму сама
    Auto,
}

impl FirmResolution {
    pub fn firm_id(&self) -> Option<&str> {
        match self {
            FirmResolution::Account(id) | FirmResolution::Default(id) => Some(id),
            FirmResolution::Auto => None,
        }
    }
}

/// Не блокирующие замечания к разрешённому сопоставлению
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    Stale {
        kind: StaleReferenceKind,
        referenced_id: String,
    },
    DuplicatePaymentMapping {
        method: i64,
        count: usize,
    },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::Stale {
                kind,
                referenced_id,
            } => write!(
                f,
                "ERP {} '{}' is no longer in the ERP directories",
                kind.label(),
                referenced_id
            ),
            ResolveWarning::DuplicatePaymentMapping { method, count } => write!(
                f,
                "payment method {} has {} mappings in this channel, the first one is used",
                method, count
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub mapping_id: String,
    pub composed_order_number: String,
    pub payment_form_id: Option<String>,
    pub cash_account_id: Option<String>,
    pub trade_channel_id: Option<String>,
    pub delivery_method_id: Option<String>,
    pub storage_id: Option<String>,
    pub firm: FirmResolution,
    pub warnings: Vec<ResolveWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No mapping configured for channel {channel_id}")]
    NoChannelMapping { channel_id: String },

    #[error("No payment mapping for payment method {payment_method:?} in channel {channel_id}")]
    NoPaymentMapping {
        channel_id: String,
        payment_method: Option<i64>,
    },
}

/// Разрешить настройки для заказа.
///
/// Ошибка означает отсутствие настройки, которую может исправить только
/// администратор. Ссылки на удалённые записи справочников не мешают
/// разрешению и возвращаются в warnings.
pub fn resolve(
    order: &SalesOrder,
    settings: &MappingSettings,
    directories: &ErpDirectories,
) -> Result<ResolvedMapping, ResolveError> {
    let channel = settings
        .channel(&order.channel_id)
        .ok_or_else(|| ResolveError::NoChannelMapping {
            channel_id: order.channel_id.clone(),
        })?;

    let no_payment_mapping = || ResolveError::NoPaymentMapping {
        channel_id: order.channel_id.clone(),
        payment_method: order.payment_method,
    };
    let method = order.payment_method.ok_or_else(no_payment_mapping)?;
    let mapping = channel
        .find_by_payment_method(method)
        .ok_or_else(no_payment_mapping)?;

    let mut warnings = Vec::new();

    let count = channel
        .mappings
        .iter()
        .filter(|m| m.sales_drive_payment_method == Some(method))
        .count();
    if count > 1 {
        tracing::warn!(
            "Channel {} has {} mappings for payment method {}",
            channel.channel_id,
            count,
            method
        );
        warnings.push(ResolveWarning::DuplicatePaymentMapping { method, count });
    }

    let payment_form_id = mapping.payment_form.clone().filter(|v| !v.is_empty());

    // наличная форма оплаты: счёт не передаётся, даже если сохранён
    let cash_account_id = if is_cash_form_id(payment_form_id.as_deref(), directories) {
        None
    } else {
        mapping.cash_account.clone().filter(|v| !v.is_empty())
    };

    let trade_channel_id = channel.erp_trade_channel_id.clone().filter(|v| !v.is_empty());

    let delivery = order.shipping_method.as_deref().and_then(|name| {
        settings
            .delivery_mappings
            .iter()
            .find(|d| d.covers(name))
    });
    let delivery_method_id = delivery
        .and_then(|d| d.erp_delivery_method_id.clone())
        .filter(|v| !v.is_empty());

    let flags = is_stale(mapping, Some(channel), delivery, directories);
    if flags.payment_form {
        warnings.push(ResolveWarning::Stale {
            kind: StaleReferenceKind::PaymentForm,
            referenced_id: payment_form_id.clone().unwrap_or_default(),
        });
    }
    if flags.cash_account && cash_account_id.is_some() {
        warnings.push(ResolveWarning::Stale {
            kind: StaleReferenceKind::CashAccount,
            referenced_id: cash_account_id.clone().unwrap_or_default(),
        });
    }
    if flags.trade_channel {
        warnings.push(ResolveWarning::Stale {
            kind: StaleReferenceKind::TradeChannel,
            referenced_id: trade_channel_id.clone().unwrap_or_default(),
        });
    }
    if flags.delivery_method {
        warnings.push(ResolveWarning::Stale {
            kind: StaleReferenceKind::DeliveryMethod,
            referenced_id: delivery_method_id.clone().unwrap_or_default(),
        });
    }

    let account_owner = cash_account_id
        .as_deref()
        .and_then(|id| directories.cash_account(id))
        .and_then(|a| a.owner.clone())
        .filter(|owner| !owner.is_empty());
    let firm = match (account_owner, settings.default_firm_id.clone()) {
        (Some(owner), _) => FirmResolution::Account(owner),
        (None, Some(default)) if !default.is_empty() => FirmResolution::Default(default),
        _ => FirmResolution::Auto,
    };

    Ok(ResolvedMapping {
        mapping_id: mapping.id.clone(),
        composed_order_number: channel.compose_order_number(&order.order_number),
        payment_form_id,
        cash_account_id,
        trade_channel_id,
        delivery_method_id,
        storage_id: settings.storage_id.clone().filter(|v| !v.is_empty()),
        firm,
        warnings,
    })
}
