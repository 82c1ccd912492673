pub mod u501_export_to_erp;
pub mod u502_reconcile_with_erp;
