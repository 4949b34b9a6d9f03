use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{QuasarSync, TriggerError};
use crate::events::trigger::Trigger;

/// Fire the pipeline every `every`, starting one period from now. Each tick
/// runs in its own task so a long run never delays the clock; ticks that land
/// on a running pipeline are rejected by its guard. Abort the handle to stop.
pub fn spawn_interval_trigger(engine: Arc<QuasarSync>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the first immediate tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let engine = engine.clone();
            tokio::spawn(async move {
                match engine.trigger(Trigger::Interval(every)).await {
                    Ok(report) => tracing::info!(success = report.success, "interval run finished"),
                    Err(TriggerError::AlreadyRunning) => {
                        tracing::info!("interval tick skipped, a run is in progress")
                    }
                    Err(e) => tracing::error!(error = %e, "interval run failed"),
                }
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{engine, CountingSink};
    use crate::metrics;
    use tokio::sync::Notify;

    #[tokio::test(start_paused = true)]
    async fn tick_fires_a_run_and_overlapping_ticks_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let sink = Arc::new(CountingSink::default());
        let engine = Arc::new(engine(tmp.path(), Some(gate.clone()), sink.clone()));

        let ticker = spawn_interval_trigger(engine.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!engine.is_running(), "no run before the first period elapses");

        while !engine.is_running() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        // Ticks at 120s and 180s land on the parked run.
        let rejected_before = metrics::rejection_count();
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(engine.is_running());
        assert!(metrics::rejection_count() >= rejected_before + 2);

        gate.notify_one();
        engine.wait_idle().await;
        ticker.abort();

        let rows = sink.0.lock().unwrap();
        assert_eq!(rows.as_slice(), ["navigation_aids__boylat__harbor:1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_further_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(CountingSink::default());
        let engine = Arc::new(engine(tmp.path(), None, sink.clone()));

        let ticker = spawn_interval_trigger(engine.clone(), Duration::from_secs(10));
        while sink.0.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        ticker.abort();
        assert!(ticker.await.unwrap_err().is_cancelled());
        // Let a run spawned just before the abort finish.
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.wait_idle().await;

        let runs = sink.0.lock().unwrap().len();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.0.lock().unwrap().len(), runs);
    }
}
