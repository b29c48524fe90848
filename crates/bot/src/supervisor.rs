//! Restart policy for long-running tasks.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info};

/// Run `task` until it returns `Ok`. Errors and panics are logged, then the
/// task is rebuilt from scratch after `backoff`.
pub async fn supervise<F, Fut>(name: &'static str, backoff: Duration, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        info!(task = name, attempt, "Starting task");

        let failure = match AssertUnwindSafe(task()).catch_unwind().await {
            Ok(Ok(())) => {
                info!(task = name, "Task finished");
                return;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => "task panicked".to_string(),
        };

        error!(
            task = name,
            error = %failure,
            backoff_secs = backoff.as_secs(),
            "Task failed, restarting after back-off"
        );
        tokio::time::sleep(backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_restarts_after_backoff() {
        let attempts = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let counter = attempts.clone();
        supervise("flaky", Duration::from_secs(30), move || {
            let counter = counter.clone();
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => anyhow::bail!("startup failed"),
                    1 => panic!("startup panicked"),
                    _ => Ok(()),
                }
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(60));
    }
}
