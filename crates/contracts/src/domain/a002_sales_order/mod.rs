pub mod aggregate;

pub use aggregate::{OrderExportState, OrderSyncResult, SalesOrder, SalesOrderView};
