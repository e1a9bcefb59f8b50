use crate::console::{ConsoleClient, ConsolePrinter, Palette};
use crate::model::Workload;
use lazy_arbiter::{AdmissionController, EngineError, RunReport};
use std::sync::Arc;
use tokio::io::{AsyncWrite, Stdout};
use tokio::task::JoinHandle;
use tracing::{error, info};

const EVENT_BUFFER: usize = 64;

/// Runtime orchestrator for the LAZY sample app.
///
/// Owns the console printer task and the client every engine run reports to.
///
/// # Example
///
/// ```ignore
/// let system = LazySystem::new();
/// let report = system.process(workload).await?;
/// system.shutdown().await?;
/// ```
pub struct LazySystem<W> {
    console: ConsoleClient,
    printer: JoinHandle<std::io::Result<W>>,
}

impl LazySystem<Stdout> {
    /// Prints to stdout, colored unless `NO_COLOR` is set.
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout(), Palette::from_env())
    }
}

impl Default for LazySystem<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> LazySystem<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Spawns the console printer on `out`.
    pub fn with_writer(out: W, palette: Palette) -> Self {
        let (printer, console) = ConsolePrinter::new(out, palette, EVENT_BUFFER);
        let printer = tokio::spawn(printer.run());
        Self { console, printer }
    }

    /// Runs the whole workload through a fresh engine and waits until every request
    /// is resolved.
    pub async fn process(&self, workload: Workload) -> Result<RunReport, EngineError> {
        let Workload { config, requests } = workload;
        let controller = AdmissionController::new(config, Arc::new(self.console.clone()))?;
        let report = controller.run(requests).await?;
        info!(
            requests = report.outcomes.len(),
            finished_at = report.finished_at,
            "Workload processed"
        );
        Ok(report)
    }

    /// Closes the event channel and waits for the printer to drain it.
    ///
    /// Returns the writer, or an error if the printer failed to write or panicked.
    pub async fn shutdown(self) -> Result<W, String> {
        info!("Shutting down system...");

        // The printer exits once the last sender is gone.
        drop(self.console);

        match self.printer.await {
            Ok(Ok(out)) => {
                info!("System shutdown complete.");
                Ok(out)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Console output failed");
                Err(format!("Console output failed: {e}"))
            }
            Err(e) => {
                error!("Console printer task failed: {:?}", e);
                Err(format!("Console printer task failed: {:?}", e))
            }
        }
    }
}
