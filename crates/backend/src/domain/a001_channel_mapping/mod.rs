pub mod repository;
pub mod resolver;
pub mod service;
pub mod validator;

pub use repository::{SettingsStore, SqliteSettingsStore};
pub use resolver::{resolve, FirmResolution, ResolveError, ResolveWarning, ResolvedMapping};
pub use service::{apply_edit, MappingEditError, MappingServiceError};
pub use validator::MappingValidator;
