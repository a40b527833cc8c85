//! Log subscriber setup
//!
//! Default level is `warn`; `verbose` raises this crate to `debug`.
//! `RUST_LOG` takes precedence over both.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,net_alarm=debug"
    } else {
        "warn"
    }
}

/// Install the global fmt subscriber writing to stderr
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
