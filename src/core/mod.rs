//! Core module - workspace, configuration, store and shared value handling

pub mod config;
pub mod duration;
pub mod store;
pub mod validation;
pub mod values;
pub mod workspace;

pub use config::Config;
pub use duration::{format_duration, parse_duration, DurationError};
pub use store::{SqliteStore, Store, StoreError};
pub use validation::{Validate, Violation, SKIP_VALIDATION_CODES};
pub use workspace::{Workspace, WorkspaceError};
