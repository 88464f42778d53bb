//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "VIGIL_LOG";

/// Filter used when `VIGIL_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "vigil=info";

/// Initialize the Vigil tracing/logging system.
///
/// Reads `VIGIL_LOG` for per-subsystem log levels, e.g.
/// `VIGIL_LOG=vigil_engines=debug,vigil_storage=warn`.
///
/// Falls back to `vigil=info`. Idempotent: only the first call installs a
/// subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Initialize tracing with explicit filter directives, ignoring `VIGIL_LOG`.
/// Invalid directives fall back to the default filter.
pub fn init_tracing_with_filter(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        // A host application may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
