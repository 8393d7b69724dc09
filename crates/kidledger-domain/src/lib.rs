//! kidledger-domain
//!
//! Pure domain models for the kids rewards ledger: money, ledger entries,
//! pocket-money rules, chores, chore entries, reminders and month projections.
//! No I/O, no storage. Only data types and calendar arithmetic.

#[macro_use]
mod macros;

pub mod calendar;
pub mod chore;
pub mod common;
pub mod entry;
pub mod ledger;
pub mod money;
pub mod pocket_money;
pub mod projection;
pub mod reminder;

pub use calendar::*;
pub use chore::*;
pub use common::*;
pub use entry::*;
pub use ledger::*;
pub use money::*;
pub use pocket_money::*;
pub use projection::*;
pub use reminder::*;
