//! # Diagnostics
//!
//! Structured logging for the engine and the app, filtered through `RUST_LOG`:
//!
//! ```bash
//! # Warnings and errors only (default)
//! lazy-sample < input.txt
//!
//! # Lifecycle
//! RUST_LOG=info lazy-sample < input.txt
//!
//! # Every lock decision and printed event
//! RUST_LOG=debug lazy-sample < input.txt
//!
//! # Only the engine
//! RUST_LOG=lazy_arbiter=debug lazy-sample < input.txt
//! ```
//!
//! With `RUST_LOG=info` a run looks like this:
//!
//! ```text
//! INFO Console printer started
//! INFO run: Run started requests=3 resources=2
//! INFO run:dispatch: Completed ticket=#0 started=1 finished=3 user=1 resource=1 op=READ
//! INFO run:dispatch: Declined ticket=#2 reason=Deleted at=4 user=3 resource=2 op=READ
//! INFO run: No more pending requests finished_at=5
//! INFO Console printer stopped printed=10
//! ```
//!
//! Span fields (`user`, `resource`, `op`) come from the dispatch span, so every
//! line of a request can be found by filtering on them.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber: an `RUST_LOG` filter in front of a compact,
/// target-less formatter on stderr.
///
/// Fails if a global subscriber is already installed.
pub fn setup_tracing() -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let diagnostics = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr); // stdout carries the event log

    tracing_subscriber::registry()
        .with(filter)
        .with(diagnostics)
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {e}"))
}
