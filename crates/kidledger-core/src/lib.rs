//! kidledger-core
//!
//! Services for the kids rewards engine: ledger store, pocket-money recurrence,
//! chore activation, chore entry workflow, month projection and reminders.
//! Owns SQLite persistence; callers pass in a connection, a clock and, for
//! reminders, a notifier.

pub mod chore_entry_service;
pub mod chore_service;
pub mod db;
pub mod error;
pub mod ledger_service;
pub mod notify;
pub mod pocket_money_service;
pub mod projection_service;
pub mod reminder_service;
pub mod repo;
pub mod time;

pub use chore_entry_service::*;
pub use chore_service::*;
pub use db::{open_db, open_db_in_memory};
pub use error::{CoreError, CoreResult};
pub use ledger_service::*;
pub use notify::*;
pub use pocket_money_service::*;
pub use projection_service::*;
pub use reminder_service::*;
pub use time::{Clock, FixedClock, SystemClock};
