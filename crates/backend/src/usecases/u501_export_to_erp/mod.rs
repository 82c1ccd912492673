pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod order_lock;
pub mod progress_tracker;

pub use error::ExportError;
pub use executor::BulkExecutor;
pub use orchestrator::ExportOrchestrator;
pub use progress_tracker::ProgressTracker;
