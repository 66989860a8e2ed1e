//! Background behavior monitoring

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::runner::MonitoringOrchestrator;

/// Run the orchestrator for `model_name` every `period`, first tick
/// immediately. Outcomes are only logged.
pub fn spawn_monitor_loop(
    orchestrator: Arc<MonitoringOrchestrator>,
    model_name: String,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(model = %model_name, period_secs = period.as_secs(), "Background monitoring started");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let outcome = orchestrator.run(&model_name).await;
            tracing::debug!(status = outcome.status(), "Background monitoring tick");
        }
    })
}
