//! # System Lifecycle
//!
//! Starts, wires and stops the pieces of one LAZY run.
//!
//! ## The LazySystem Pattern
//!
//! [`LazySystem`] is the conductor:
//!
//! ```rust,ignore
//! let system = LazySystem::new();            // spawns the console printer
//! let report = system.process(workload).await?;  // one engine run
//! system.shutdown().await?;                  // drop the client, await the printer
//! ```
//!
//! 1. **Creation** - the console printer is spawned first, so the banner is printed
//!    before any event.
//! 2. **Wiring** - every engine run gets a clone of the printer's client as its
//!    event sink.
//! 3. **Shutdown** - dropping the last client closes the channel; the printer drains
//!    what is left and hands its writer back.
//!
//! ## Observability
//!
//! [`setup_tracing`] installs the diagnostic subscriber. Diagnostics go to stderr so
//! they never interleave with the event log on stdout.

mod system;
mod tracing;

pub use system::LazySystem;
pub use self::tracing::setup_tracing;
