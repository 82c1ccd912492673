//! Конвейер выгрузки одного заказа: проверка -> выгрузка -> отгрузка.
//!
//! Каждый этап принимает результат предыдущего по значению, поэтому
//! токен ERP нельзя использовать дважды или передать в чужой заказ.
//! После завершения запуска токены пропадают вместе с его данными.

use super::error::{ExportError, Stage};
use super::order_lock::OrderLocks;
use crate::domain::a001_channel_mapping::{resolve, ResolvedMapping, SettingsStore};
use crate::domain::a002_sales_order::OrderStore;
use crate::shared::erp::{
    ErpApi, ErpOrderPayload, ErpShipmentPayload, ExportOutcome, IdempotencyToken,
    ShipmentOutcome, ValidateOutcome,
};
use chrono::{DateTime, Utc};
use contracts::domain::a002_sales_order::aggregate::SalesOrder;
use contracts::usecases::u501_export_to_erp::{ExportResultKind, ExportRunState, OrderRunReport};
use std::sync::Arc;

/// Заказ, прошедший проверку; токен проверки ждёт выгрузки
pub struct ValidatedOrder {
    order: SalesOrder,
    resolved: ResolvedMapping,
    payload: ErpOrderPayload,
    token: IdempotencyToken,
}

impl ValidatedOrder {
    pub fn resolved(&self) -> &ResolvedMapping {
        &self.resolved
    }
}

/// Заказ после выгрузки; токен продажи ждёт отгрузки
pub struct ExportedOrder {
    order: SalesOrder,
    resolved: ResolvedMapping,
    result: ExportResultKind,
    sale_token: IdempotencyToken,
}

impl ExportedOrder {
    pub fn result(&self) -> ExportResultKind {
        self.result
    }

    pub fn erp_doc_id(&self) -> Option<&str> {
        self.order.export_state.erp_doc_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentStep {
    Shipped(DateTime<Utc>),
    /// Документа заказа в ERP нет, отгрузку не к чему привязать
    Skipped,
}

pub struct ExportOrchestrator {
    erp: Arc<dyn ErpApi>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingsStore>,
    locks: OrderLocks,
}

fn build_payload(order: &SalesOrder, resolved: &ResolvedMapping) -> ErpOrderPayload {
    ErpOrderPayload {
        order_number: resolved.composed_order_number.clone(),
        storefront_order_id: order.id,
        channel_id: order.channel_id.clone(),
        payment_form_id: resolved.payment_form_id.clone(),
        cash_account_id: resolved.cash_account_id.clone(),
        trade_channel_id: resolved.trade_channel_id.clone(),
        delivery_method_id: resolved.delivery_method_id.clone(),
        firm_id: resolved.firm.firm_id().map(String::from),
        storage_id: resolved.storage_id.clone(),
        order_date: order.order_date,
        total_amount: order.total_amount,
        items: order.items.clone(),
    }
}

fn transition(report: &mut OrderRunReport, state: ExportRunState) {
    tracing::info!(
        "Order {} ({}): {:?} -> {:?}",
        report.order_id,
        report.order_number,
        report.state,
        state
    );
    report.state = state;
}

fn fail(report: &mut OrderRunReport, state: ExportRunState, error: ExportError) {
    tracing::warn!(
        "Order {} ({}) failed: {}",
        report.order_id,
        report.order_number,
        error
    );
    report.errors.push(error.to_reported());
    transition(report, state);
}

impl ExportOrchestrator {
    pub fn new(
        erp: Arc<dyn ErpApi>,
        orders: Arc<dyn OrderStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            erp,
            orders,
            settings,
            locks: OrderLocks::new(),
        }
    }

    pub fn locks(&self) -> &OrderLocks {
        &self.locks
    }

    /// Разрешить настройки и проверить заказ в ERP
    pub async fn validate(&self, order: SalesOrder) -> Result<ValidatedOrder, ExportError> {
        let settings = self
            .settings
            .load()
            .await
            .map_err(|e| ExportError::Storage(e.to_string()))?;
        let directories = self
            .erp
            .fetch_directories()
            .await
            .map_err(|e| ExportError::from_erp(Stage::Validate, e))?;

        let resolved = resolve(&order, &settings, &directories)?;
        for warning in &resolved.warnings {
            tracing::warn!("Order {}: {}", resolved.composed_order_number, warning);
        }

        let payload = build_payload(&order, &resolved);
        let outcome = self
            .erp
            .validate_order(&payload)
            .await
            .map_err(|e| ExportError::from_erp(Stage::Validate, e))?;

        match outcome {
            ValidateOutcome::Accepted { token } => {
                tracing::debug!(
                    "Order {} validated (token: {})",
                    payload.order_number,
                    token.is_present()
                );
                Ok(ValidatedOrder {
                    order,
                    resolved,
                    payload,
                    token,
                })
            }
            ValidateOutcome::CriticalConfiguration { details } => {
                Err(ExportError::CriticalConfiguration(details))
            }
            ValidateOutcome::Rejected { message } => Err(ExportError::RecoverableValidation(message)),
        }
    }

    /// Выгрузить заказ. Токен проверки уходит в ERP и больше недоступен.
    pub async fn export(&self, validated: ValidatedOrder) -> Result<ExportedOrder, ExportError> {
        let ValidatedOrder {
            mut order,
            resolved,
            payload,
            token,
        } = validated;

        let outcome = self
            .erp
            .export_order(&payload, token)
            .await
            .map_err(|e| ExportError::from_erp(Stage::Export, e))?;

        match outcome {
            ExportOutcome::Created {
                doc_id,
                export_date,
                sale_token,
            } => {
                tracing::info!("Order {} exported as {}", payload.order_number, doc_id);
                order.export_state.erp_doc_id = Some(doc_id.clone());
                order.export_state.erp_export_date = Some(export_date);
                self.orders
                    .save_export_state(order.id, &order.export_state)
                    .await
                    .map_err(|e| {
                        ExportError::Storage(format!(
                            "ERP document {} created but not saved locally: {}",
                            doc_id, e
                        ))
                    })?;
                Ok(ExportedOrder {
                    order,
                    resolved,
                    result: ExportResultKind::Created,
                    sale_token,
                })
            }
            ExportOutcome::NoChanges => {
                tracing::info!("Order {}: no changes in ERP", payload.order_number);
                Ok(ExportedOrder {
                    order,
                    resolved,
                    result: ExportResultKind::NoChanges,
                    sale_token: IdempotencyToken::NoToken,
                })
            }
            ExportOutcome::Rejected { message } => Err(ExportError::Export(message)),
        }
    }

    /// Создать отгрузку по выгруженному заказу. Без документа заказа в ERP
    /// обращения к ERP нет.
    pub async fn ship(&self, exported: ExportedOrder) -> Result<ShipmentStep, ExportError> {
        let ExportedOrder {
            mut order,
            resolved,
            sale_token,
            ..
        } = exported;

        let Some(erp_doc_id) = order.export_state.erp_doc_id.clone() else {
            return Ok(ShipmentStep::Skipped);
        };

        let payload = ErpShipmentPayload {
            order_number: resolved.composed_order_number.clone(),
            erp_doc_id,
            firm_id: resolved.firm.firm_id().map(String::from),
            storage_id: resolved.storage_id.clone(),
        };

        let outcome = self
            .erp
            .create_shipment(&payload, sale_token)
            .await
            .map_err(|e| ExportError::from_erp(Stage::Shipment, e))?;

        match outcome {
            ShipmentOutcome::Created { date, message } => {
                tracing::info!("Order {}: {}", payload.order_number, message);
                order.export_state.erp_sale_export_date = Some(date);
                self.orders
                    .save_export_state(order.id, &order.export_state)
                    .await
                    .map_err(|e| ExportError::Storage(e.to_string()))?;
                Ok(ShipmentStep::Shipped(date))
            }
            ShipmentOutcome::NotCreated { message } => Err(ExportError::Shipment(message)),
        }
    }

    /// Полный запуск по id заказа. Ошибки не пробрасываются, а попадают
    /// в отчёт вместе с состоянием, на котором конвейер остановился.
    pub async fn run(&self, order_id: i64, with_shipment: bool) -> OrderRunReport {
        let mut report = OrderRunReport::new(order_id);

        let Some(_guard) = self.locks.try_acquire(order_id) else {
            let error = ExportError::AlreadyInProgress(order_id);
            tracing::warn!("{}", error);
            report.errors.push(error.to_reported());
            return report;
        };

        let order = match self.orders.get_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                report.errors.push(ExportError::OrderNotFound(order_id).to_reported());
                return report;
            }
            Err(e) => {
                report
                    .errors
                    .push(ExportError::Storage(e.to_string()).to_reported());
                return report;
            }
        };
        report.order_number = order.order_number.clone();

        transition(&mut report, ExportRunState::Validating);
        let validated = match self.validate(order).await {
            Ok(v) => v,
            Err(e) => {
                let state = if e.is_critical() {
                    ExportRunState::ValidationFailedCritical
                } else {
                    ExportRunState::ValidationFailedRecoverable
                };
                fail(&mut report, state, e);
                return report;
            }
        };
        report.order_number = validated.resolved.composed_order_number.clone();
        report.warnings = validated
            .resolved
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect();
        transition(&mut report, ExportRunState::Validated);

        let exported = match self.export(validated).await {
            Ok(exported) => exported,
            Err(e) => {
                fail(&mut report, ExportRunState::ExportFailed, e);
                return report;
            }
        };
        report.export_success = true;
        report.export_result = Some(exported.result());
        report.erp_doc_id = exported.erp_doc_id().map(String::from);
        transition(&mut report, ExportRunState::Exported);

        if !with_shipment {
            return report;
        }

        match self.ship(exported).await {
            Ok(ShipmentStep::Shipped(_)) => {
                report.shipment_success = Some(true);
                transition(&mut report, ExportRunState::Shipped);
            }
            Ok(ShipmentStep::Skipped) => {
                report
                    .warnings
                    .push("No ERP sale order id is known locally, shipment skipped".to_string());
                transition(&mut report, ExportRunState::ShipmentSkipped);
            }
            Err(e) => {
                report.shipment_success = Some(false);
                fail(&mut report, ExportRunState::ShipmentFailed, e);
            }
        }
        report
    }
}
