//! Tracing setup for tests and binaries
//!
//! Both entry points read `RUST_LOG` and fall back to a crate-wide level:
//! - `RUST_LOG=rustywifi=debug` - per-candidate decisions
//! - `RUST_LOG=rustywifi::kalman=trace` - per-symbol phase tracking
//! - `RUST_LOG=rustywifi=debug,rustywifi::sync=trace` - mixed levels

#[cfg(test)]
use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a test-captured subscriber at `warn` unless `RUST_LOG` says otherwise
///
/// Safe to call from every test; only the first call installs.
#[cfg(test)]
pub fn init_test_tracing() {
    static TRACING: Lazy<()> = Lazy::new(|| {
        fmt()
            .with_env_filter(filter("rustywifi=warn"))
            .with_target(true)
            .with_line_number(true)
            .with_test_writer()
            .init();
    });
    Lazy::force(&TRACING);
}

/// Install the subscriber for a binary, defaulting to `info`
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(filter("rustywifi=info"))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}
