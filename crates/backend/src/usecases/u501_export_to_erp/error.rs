use crate::domain::a001_channel_mapping::ResolveError;
use crate::shared::erp::ErpApiError;
use contracts::usecases::u501_export_to_erp::{ExportErrorKind, ReportedError};
use thiserror::Error;

/// Этап конвейера, на котором получена ошибка ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Export,
    Shipment,
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Канал или способ оплаты не настроены; повтор без правки настроек бесполезен
    #[error("Critical configuration error: {0}")]
    CriticalConfiguration(String),

    #[error("ERP rejected the order: {0}")]
    RecoverableValidation(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Shipment failed: {0}")]
    Shipment(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Sales order {0} not found")]
    OrderNotFound(i64),

    #[error("Export of order {0} is already in progress")]
    AlreadyInProgress(i64),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ExportError {
    /// Ошибка ERP с учётом этапа: транспорт всегда Network,
    /// остальное относится к этапу и несёт исходный ответ ERP
    pub fn from_erp(stage: Stage, error: ErpApiError) -> Self {
        let message = match error {
            ErpApiError::Network(msg) => return ExportError::Network(msg),
            ErpApiError::Http { status, body } => format!("HTTP {}: {}", status, body),
            ErpApiError::Decode(msg) => msg,
        };
        match stage {
            Stage::Validate => ExportError::RecoverableValidation(message),
            Stage::Export => ExportError::Export(message),
            Stage::Shipment => ExportError::Shipment(message),
        }
    }

    pub fn kind(&self) -> ExportErrorKind {
        match self {
            ExportError::CriticalConfiguration(_) => ExportErrorKind::CriticalConfiguration,
            ExportError::RecoverableValidation(_) => ExportErrorKind::RecoverableValidation,
            ExportError::Export(_) => ExportErrorKind::Export,
            ExportError::Shipment(_) => ExportErrorKind::Shipment,
            ExportError::Network(_) => ExportErrorKind::Network,
            ExportError::OrderNotFound(_) => ExportErrorKind::OrderNotFound,
            ExportError::AlreadyInProgress(_) => ExportErrorKind::AlreadyInProgress,
            ExportError::Storage(_) => ExportErrorKind::Storage,
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, ExportError::CriticalConfiguration(_))
    }

    /// Можно повторить без вмешательства администратора
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExportError::Network(_) | ExportError::AlreadyInProgress(_) | ExportError::Storage(_)
        )
    }

    pub fn to_reported(&self) -> ReportedError {
        ReportedError {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}

impl From<ResolveError> for ExportError {
    fn from(e: ResolveError) -> Self {
        ExportError::CriticalConfiguration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erp_errors_by_stage() {
        let e = ExportError::from_erp(Stage::Export, ErpApiError::Network("timeout".into()));
        assert_eq!(e.kind(), ExportErrorKind::Network);
        assert!(e.is_retryable());

        let e = ExportError::from_erp(
            Stage::Shipment,
            ErpApiError::Http {
                status: 500,
                body: "Документ не проведено".into(),
            },
        );
        assert_eq!(e.kind(), ExportErrorKind::Shipment);
        assert!(e.to_string().contains("Документ не проведено"));

        let e = ExportError::from_erp(Stage::Validate, ErpApiError::Decode("bad json".into()));
        assert_eq!(e.kind(), ExportErrorKind::RecoverableValidation);
        assert!(!e.is_critical());
    }

    #[test]
    fn test_resolve_error_is_critical() {
        let e: ExportError = ResolveError::NoChannelMapping {
            channel_id: "99".into(),
        }
        .into();
        assert!(e.is_critical());
        assert!(!e.is_retryable());
        assert_eq!(e.to_reported().kind, ExportErrorKind::CriticalConfiguration);
        assert!(!e.to_reported().retryable);

        let reported = ExportError::Network("timeout".into()).to_reported();
        assert!(reported.retryable);
    }
}
