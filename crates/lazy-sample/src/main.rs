//! # LAZY
//!
//! Reads a workload from standard input, arbitrates it and prints what happened:
//!
//! ```text
//! 2 3 1
//! 3 2 5
//! 1 1 READ 0
//! 2 1 WRITE 1
//! 3 2 DELETE 2
//! STOP
//! ```
//!
//! Set `NO_COLOR` for uncolored output and `RUST_LOG` for diagnostics on stderr.

use lazy_sample::input::parse_workload;
use lazy_sample::lifecycle::{setup_tracing, LazySystem};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing()?;

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(|e| format!("Failed to read input: {e}"))?;

    let workload = parse_workload(&text).map_err(|e| {
        error!(error = %e, "Invalid input");
        e.to_string()
    })?;
    info!(
        requests = workload.requests.len(),
        files = workload.config.resource_count,
        "Workload parsed"
    );

    let system = LazySystem::new();
    let result = system.process(workload).await;
    system.shutdown().await?;

    let report = result.map_err(|e| e.to_string())?;
    info!(finished_at = report.finished_at, "Done");
    Ok(())
}
