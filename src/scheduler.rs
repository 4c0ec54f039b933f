//! Recurring fetch task.
//!
//! An explicit timer abstraction the hosting process starts and stops:
//! one tokio task ticking at a fixed interval, each tick running the
//! scheduled fetch to completion. Errors are logged and swallowed so a
//! bad tick never kills the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ingest::IngestService;

/// Handle to the background fetch loop.
pub struct FetchScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FetchScheduler {
    /// Start ticking. The first fetch runs after one full interval.
    pub fn start(service: Arc<IngestService>, interval: Duration) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick is consumed here so the loop
            // waits a full interval before the first fetch.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        info!("scheduled fetch tick");
                        match service.run_scheduled_fetch().await {
                            Ok(report) => info!(
                                "tick done: {} imported, {} failed",
                                report.imported, report.failed
                            ),
                            Err(e) => error!("scheduled fetch failed: {:#}", e),
                        }
                    }
                    _ = stopped.changed() => {
                        info!("fetch scheduler stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Signal the loop to stop and wait for it to finish. An in-flight
    /// fetch runs to completion first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arxiv::{ArxivClient, ArxivConfig};
    use crate::llm::{AnalysisClient, LlmConfig};
    use crate::repository::DbContext;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scheduler_starts_and_stops() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"), dir.path());
        ctx.init_schema().await.unwrap();

        let service = Arc::new(IngestService::new(
            ArxivClient::new(ArxivConfig::default()),
            AnalysisClient::new(LlmConfig::default()),
            ctx,
            5,
        ));

        let scheduler = FetchScheduler::start(service, Duration::from_secs(3600));
        scheduler.stop().await;
    }
}
