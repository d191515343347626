//! Tracing subscriber setup.
//!
//! Quiet by default. Set `PMDREF_LOG` (or `RUST_LOG`) to a filter such as
//! `debug` or `pmdref::variable=trace` to see cache and search events on stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter; wins over `RUST_LOG`.
const LOG_ENV: &str = "PMDREF_LOG";

/// Build an `EnvFilter` from `PMDREF_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        return EnvFilter::builder().parse_lossy(directives);
    }
    return EnvFilter::from_default_env();
}

/// Install the global subscriber when a filter variable is set.
/// Output goes to stderr so stdout stays machine-readable.
pub fn init() {
    if std::env::var_os(LOG_ENV).is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .init();
}
