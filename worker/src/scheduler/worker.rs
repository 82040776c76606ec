use std::{future::Future, time::Duration};

use anyhow::Result;
use crates::usecases::sweeps::SweepReport;
use tracing::{debug, error, info};

/// Runs `tick` forever, sleeping `period` after each run. A failed tick is logged and
/// redone on the next interval.
pub async fn run_every<F, Fut>(job: &'static str, period: Duration, mut tick: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SweepReport>>,
{
    info!(job, period_secs = period.as_secs(), "scheduler: starting job loop");
    loop {
        match tick().await {
            Ok(report) if report.scanned > 0 => info!(
                job,
                scanned = report.scanned,
                applied = report.applied,
                skipped = report.skipped,
                failed = report.failed,
                "scheduler: tick finished"
            ),
            Ok(_) => debug!(job, "scheduler: nothing to do"),
            Err(e) => error!(job, error = ?e, "scheduler: tick failed"),
        }

        tokio::time::sleep(period).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[tokio::test]
    async fn keeps_ticking_after_a_failed_tick() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let job = tokio::spawn(run_every("test", Duration::from_millis(5), move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("store unavailable");
                }
                Ok(SweepReport::scanned(1))
            }
        }));

        tokio::time::sleep(Duration::from_millis(200)).await;
        job.abort();

        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }
}
