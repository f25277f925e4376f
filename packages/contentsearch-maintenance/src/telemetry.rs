//! Tracing subscriber setup
//!
//! `init_tracing` is for binaries and logs to stderr. `init_test_tracing`
//! routes output through the libtest capture so it only shows for failing tests.

use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` if set, otherwise `default_filter`
fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a global fmt subscriber writing to stderr. Returns false if a
/// subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Same as `init_tracing`, but captured by the test harness
pub fn init_test_tracing(default_filter: &str) -> bool {
    fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(false)
        .with_test_writer()
        .try_init()
        .is_ok()
}
