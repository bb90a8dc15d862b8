pub mod bundle;
pub mod config;
pub mod discovery;
pub mod error;
pub mod snapshot;
pub mod validation;

// Re-export main types
pub use bundle::*;
pub use config::*;
pub use error::*;
pub use snapshot::*;

pub use discovery::{CONFIG_FILE, ConfigDiscovery, ENV_PREFIX, read_user_value};
pub use validation::validate;
