use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::clients::telegram::TelegramClient;
use crate::dispatcher::Dispatcher;

/// Pause after a failed `getUpdates` before polling again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Authenticate, clear any webhook, then fetch and dispatch updates one at a
/// time forever. Only unrecoverable API errors end the loop.
pub async fn run(client: TelegramClient, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let me = client.get_me().await?;
    info!(bot_id = me.id, username = ?me.username, "Bot authenticated");

    client.delete_webhook().await?;
    info!("Starting long-poll loop");

    let mut offset = 0;
    loop {
        match client.get_updates(offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatcher.dispatch(update).await;
                }
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                error!(error = %e, "Failed to fetch updates");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
