pub mod progress;
pub mod request;
pub mod response;

pub use progress::{BulkProgress, BulkStatus};
pub use request::{BulkRequest, ExportOrderRequest};
pub use response::{
    BulkReport, BulkStartResponse, BulkStartStatus, ExportErrorKind, ExportResultKind,
    ExportRunState, OrderRunReport, ReportedError,
};
