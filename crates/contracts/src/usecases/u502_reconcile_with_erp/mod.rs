pub mod request;
pub mod response;

pub use request::ReconcileRequest;
pub use response::{ReconcileItem, ReconcileResponse, ReconciledField};
