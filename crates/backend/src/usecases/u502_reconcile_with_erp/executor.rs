use crate::domain::a001_channel_mapping::SettingsStore;
use crate::domain::a002_sales_order::OrderStore;
use crate::shared::erp::{ErpApi, ErpApiError, ErpDocumentLookup};
use contracts::domain::a002_sales_order::aggregate::{OrderExportState, SalesOrder};
use contracts::usecases::u502_reconcile_with_erp::{
    ReconcileItem, ReconcileResponse, ReconciledField,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("ERP lookup failed: {0}")]
    Erp(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ErpApiError> for ReconcileError {
    fn from(e: ErpApiError) -> Self {
        match e {
            ErpApiError::Network(msg) => ReconcileError::Network(msg),
            other => ReconcileError::Erp(other.to_string()),
        }
    }
}

/// Дополнить локальные отметки тем, что ERP подтверждает.
/// Поля только заполняются или исправляются, очистки нет.
pub fn merge_lookup(
    state: &OrderExportState,
    lookup: &ErpDocumentLookup,
) -> (OrderExportState, Vec<ReconciledField>) {
    let mut next = state.clone();
    let mut changed = Vec::new();

    if let Some(doc) = &lookup.sale_order {
        if next.erp_doc_id.as_deref() != Some(doc.id.as_str()) {
            next.erp_doc_id = Some(doc.id.clone());
            changed.push(ReconciledField::DilovodDocId);
        }
        if let Some(date) = doc.date {
            if next.erp_export_date != Some(date) {
                next.erp_export_date = Some(date);
                changed.push(ReconciledField::DilovodExportDate);
            }
        }
    }
    if let Some(date) = lookup.shipment_date {
        if next.erp_sale_export_date != Some(date) {
            next.erp_sale_export_date = Some(date);
            changed.push(ReconciledField::DilovodSaleExportDate);
        }
    }
    if let Some(date) = lookup.cash_in_date {
        if next.erp_cash_in_date != Some(date) {
            next.erp_cash_in_date = Some(date);
            changed.push(ReconciledField::DilovodCashInDate);
        }
    }

    (next, changed)
}

/// Сверка заказов с ERP. В ERP ничего не создаёт.
pub struct ReconcileChecker {
    erp: Arc<dyn ErpApi>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingsStore>,
}

impl ReconcileChecker {
    pub fn new(
        erp: Arc<dyn ErpApi>,
        orders: Arc<dyn OrderStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            erp,
            orders,
            settings,
        }
    }

    /// Сверить заказы одним пакетным запросом к ERP.
    /// Порядок результатов совпадает с порядком order_ids.
    pub async fn reconcile(&self, order_ids: &[i64]) -> Result<ReconcileResponse, ReconcileError> {
        self.reconcile_request(order_ids, &[]).await
    }

    /// Сверка по id и по составным номерам ERP ("RZ-9386").
    /// Сначала идут результаты по id, затем по номерам.
    pub async fn reconcile_request(
        &self,
        order_ids: &[i64],
        order_numbers: &[String],
    ) -> Result<ReconcileResponse, ReconcileError> {
        tracing::info!(
            "Reconciling {} orders and {} order numbers with ERP",
            order_ids.len(),
            order_numbers.len()
        );

        let settings = self
            .settings
            .load()
            .await
            .map_err(|e| ReconcileError::Storage(e.to_string()))?;

        let mut targets: Vec<Target> = Vec::with_capacity(order_ids.len() + order_numbers.len());
        for &id in order_ids {
            let order = self
                .orders
                .get_by_id(id)
                .await
                .map_err(|e| ReconcileError::Storage(e.to_string()))?;
            targets.push(match order {
                Some(o) => {
                    let number = settings.compose_order_number(&o.channel_id, &o.order_number);
                    Target::Found(o, number)
                }
                None => Target::Missing {
                    order_id: Some(id),
                    order_number: String::new(),
                    error: format!("Sales order {} not found", id),
                },
            });
        }

        if !order_numbers.is_empty() {
            // составной номер восстанавливается только через композер
            let mut by_number: HashMap<String, SalesOrder> = HashMap::new();
            for order in self
                .orders
                .list()
                .await
                .map_err(|e| ReconcileError::Storage(e.to_string()))?
            {
                let number = settings.compose_order_number(&order.channel_id, &order.order_number);
                by_number.entry(number).or_insert(order);
            }
            for number in order_numbers {
                targets.push(match by_number.get(number) {
                    Some(o) => Target::Found(o.clone(), number.clone()),
                    None => Target::Missing {
                        order_id: None,
                        order_number: number.clone(),
                        error: format!("No local order with ERP number {}", number),
                    },
                });
            }
        }

        let numbers: Vec<String> = targets
            .iter()
            .filter_map(|t| match t {
                Target::Found(_, n) => Some(n.clone()),
                Target::Missing { .. } => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let found: HashMap<String, ErpDocumentLookup> = if numbers.is_empty() {
            HashMap::new()
        } else {
            self.erp
                .lookup_documents(&numbers)
                .await?
                .into_iter()
                .map(|d| (d.order_number.clone(), d))
                .collect()
        };

        let mut items = Vec::with_capacity(targets.len());
        for target in targets {
            let (order, number) = match target {
                Target::Found(order, number) => (order, number),
                Target::Missing {
                    order_id,
                    order_number,
                    error,
                } => {
                    items.push(ReconcileItem {
                        order_id,
                        order_number,
                        found: false,
                        updated_count: 0,
                        updated_fields: Vec::new(),
                        error: Some(error),
                    });
                    continue;
                }
            };

            let mut item = ReconcileItem {
                order_id: Some(order.id),
                order_number: number.clone(),
                found: false,
                updated_count: 0,
                updated_fields: Vec::new(),
                error: None,
            };

            if let Some(lookup) = found.get(&number) {
                item.found = lookup.sale_order.is_some();
                // повторный заказ в запросе видит уже сохранённое состояние
                let current = match self.orders.get_by_id(order.id).await {
                    Ok(Some(fresh)) => fresh.export_state,
                    _ => order.export_state.clone(),
                };
                let (next, changed) = merge_lookup(&current, lookup);
                if !changed.is_empty() {
                    match self.orders.save_export_state(order.id, &next).await {
                        Ok(()) => {
                            tracing::info!(
                                "Order {} reconciled: {} fields updated",
                                number,
                                changed.len()
                            );
                            item.updated_count = changed.len() as i32;
                            item.updated_fields = changed;
                        }
                        Err(e) => {
                            tracing::error!("Failed to save reconciled state of {}: {}", number, e);
                            item.error = Some(e.to_string());
                        }
                    }
                }
            }
            items.push(item);
        }

        let response = ReconcileResponse::from_items(items);
        tracing::info!("Reconcile done: {} fields updated", response.total_updated);
        Ok(response)
    }
}

enum Target {
    Found(SalesOrder, String),
    Missing {
        order_id: Option<i64>,
        order_number: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::erp::ErpDocumentRef;
    use crate::shared::testing::{fixed_date, ErpCall, FakeErp, InMemoryOrderStore, InMemorySettingsStore};
    use contracts::domain::a001_channel_mapping::aggregate::{ChannelMapping, MappingSettings};
    use contracts::shared::directories::ErpDirectories;

    fn lookup(number: &str, doc: Option<&str>, shipped: bool, paid: bool) -> ErpDocumentLookup {
        ErpDocumentLookup {
            order_number: number.into(),
            sale_order: doc.map(|id| ErpDocumentRef {
                id: id.into(),
                date: Some(fixed_date(1)),
            }),
            shipment_date: shipped.then(|| fixed_date(2)),
            cash_in_date: paid.then(|| fixed_date(3)),
        }
    }

    #[test]
    fn test_merge_counts_changed_fields() {
        let (next, changed) = merge_lookup(
            &OrderExportState::default(),
            &lookup("RZ-1", Some("D1"), true, false),
        );
        assert_eq!(
            changed,
            vec![
                ReconciledField::DilovodDocId,
                ReconciledField::DilovodExportDate,
                ReconciledField::DilovodSaleExportDate
            ]
        );
        assert!(next.is_shipped());
        assert!(!next.is_paid());

        // nothing new the second time
        let (_, changed) = merge_lookup(&next, &lookup("RZ-1", Some("D1"), true, false));
        assert!(changed.is_empty());
    }

    #[test]
    fn test_merge_never_clears() {
        let state = OrderExportState {
            erp_doc_id: Some("D1".into()),
            erp_export_date: Some(fixed_date(1)),
            erp_sale_export_date: Some(fixed_date(2)),
            erp_cash_in_date: Some(fixed_date(3)),
        };
        let (next, changed) = merge_lookup(&state, &lookup("RZ-1", None, false, false));
        assert_eq!(next, state);
        assert!(changed.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_is_one_batched_lookup() {
        let erp = Arc::new(FakeErp::new(ErpDirectories::default()));
        erp.put_document(lookup("RZ-1", Some("D1"), true, true));
        erp.put_document(lookup("RZ-2", Some("D2"), false, false));

        let orders = Arc::new(InMemoryOrderStore::default());
        for id in [1, 2, 3] {
            orders.insert(SalesOrder::new_from_storefront(id, id.to_string(), "22".into()));
        }

        let mut settings = MappingSettings::default();
        let mut channel = ChannelMapping::new("22");
        channel.prefix_order = Some("RZ-".into());
        settings.channel_payment_mapping.insert("22".into(), channel);

        let checker = ReconcileChecker::new(
            erp.clone(),
            orders.clone(),
            Arc::new(InMemorySettingsStore::with(settings)),
        );
        let response = checker.reconcile(&[1, 2, 3, 404]).await.unwrap();

        assert_eq!(
            erp.calls(),
            vec![ErpCall::Lookup {
                order_numbers: vec!["RZ-1".into(), "RZ-2".into(), "RZ-3".into()]
            }]
        );
        assert_eq!(response.data.len(), 4);
        assert_eq!(response.data[0].updated_count, 4);
        assert_eq!(response.data[1].updated_count, 2);
        assert!(!response.data[2].found);
        assert_eq!(response.data[2].updated_count, 0);
        assert!(response.data[3].error.is_some());
        assert_eq!(response.total_updated, 6);

        assert!(orders.export_state(1).is_paid());
        assert_eq!(orders.export_state(2).erp_doc_id.as_deref(), Some("D2"));

        // a second pass changes nothing
        let again = checker.reconcile(&[1, 2]).await.unwrap();
        assert_eq!(again.total_updated, 0);
    }

    #[tokio::test]
    async fn test_reconcile_by_composed_number() {
        let erp = Arc::new(FakeErp::new(ErpDirectories::default()));
        erp.put_document(lookup("RZ-9386", Some("D9"), true, false));

        let orders = Arc::new(InMemoryOrderStore::default());
        orders.insert(SalesOrder::new_from_storefront(7, "9386".into(), "22".into()));
        orders.insert(SalesOrder::new_from_storefront(8, "9386".into(), "31".into()));

        let mut settings = MappingSettings::default();
        let mut channel = ChannelMapping::new("22");
        channel.prefix_order = Some("RZ-".into());
        settings.channel_payment_mapping.insert("22".into(), channel);

        let checker = ReconcileChecker::new(
            erp.clone(),
            orders.clone(),
            Arc::new(InMemorySettingsStore::with(settings)),
        );
        let response = checker
            .reconcile_request(&[], &["RZ-9386".to_string(), "RZ-1".to_string()])
            .await
            .unwrap();

        assert_eq!(
            erp.calls(),
            vec![ErpCall::Lookup {
                order_numbers: vec!["RZ-9386".into()]
            }]
        );
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].order_id, Some(7));
        assert_eq!(response.data[0].updated_count, 3);
        assert_eq!(response.data[1].order_id, None);
        assert!(response.data[1].error.is_some());

        assert_eq!(orders.export_state(7).erp_doc_id.as_deref(), Some("D9"));
        assert!(orders.export_state(8).erp_doc_id.is_none());
    }
}
