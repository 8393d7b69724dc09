//! kidledger wires the rewards engine together: a SQLite connection, a clock,
//! a notification dispatcher and persisted configuration behind one facade.

pub mod errors;
pub mod kid_ledger;
pub mod notifier;
pub mod utils;

pub use errors::KidLedgerError;
pub use kid_ledger::KidLedger;
pub use notifier::TracingNotifier;

pub use kidledger_config as config;
pub use kidledger_core as core;
pub use kidledger_domain as domain;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup log.
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_DIRECTIVE);
}

/// Same as [`init`] with an extra default directive, e.g. from config.
pub fn init_with_filter(directive: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!("kidledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
