use std::sync::Once;

static TRACING_INIT: Once = Once::new();

pub const DEFAULT_LOG_DIRECTIVE: &str = "kidledger=info";

/// Initializes the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` is honoured; `directive` is added on top of it.
pub fn init_tracing(directive: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        match directive.parse() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(_) => {
                if let Ok(fallback) = DEFAULT_LOG_DIRECTIVE.parse() {
                    filter = filter.add_directive(fallback);
                }
            }
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
