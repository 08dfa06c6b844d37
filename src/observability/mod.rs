//! Observability and telemetry.
//!
//! Structured logging goes through `tracing`; the CLI initializes a
//! stderr subscriber here so stdout stays reserved for operator output
//! (progress lines and the run summary).

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects between
/// debug- and info-level defaults for this crate. Safe to call more
/// than once; only the first call installs a subscriber.
pub fn init(verbose: bool) {
    INIT.get_or_init(|| {
        let default_filter = if verbose {
            "repovault=debug,info"
        } else {
            "repovault=info,warn"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
