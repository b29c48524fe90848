use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Ping our own public URL on a fixed interval so the host does not idle
/// the process. Failures are logged and retried on the next tick.
pub async fn run(url: String, interval: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match client.get(&url).send().await {
            Ok(resp) => debug!(status = %resp.status(), "Keep-alive ping"),
            Err(e) => warn!(error = %e, "Keep-alive ping failed"),
        }
    }
}
