//! kidledger-config
//!
//! Persistent settings for the rewards engine: where the database lives, log
//! filtering, and defaults applied by the facade and the jobs binary.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, EntrySettings, ReminderLinkSettings};
