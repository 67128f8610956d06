//! Diagnostic logging setup
//!
//! Structured diagnostics go to stderr through `tracing`; stdout stays
//! reserved for the CLI's own output.

use tracing_subscriber::EnvFilter;

/// Directive used for a given `-v` count when `RUST_LOG` is not set
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "play_publisher=info,warn",
        _ => "play_publisher=debug,info",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
