//! Subscriber setup for the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_DIRECTIVE: &str = "submission_ingestor=info";

/// Install a global subscriber writing to stdout, as JSON lines when `json`
/// is set. `RUST_LOG` overrides the default filter.
pub fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stdout));
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stdout));

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}
