pub mod executor;

pub use executor::{ReconcileChecker, ReconcileError};
