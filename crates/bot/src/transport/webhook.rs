use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::clients::telegram::TelegramClient;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::routes::{self, webhook::WebhookState};

/// Authenticate, register the webhook URL and serve it alongside the health page.
pub async fn run(
    config: &Config,
    client: TelegramClient,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    let me = client.get_me().await?;
    info!(bot_id = me.id, username = ?me.username, "Bot authenticated");

    let public_url = config
        .public_url
        .as_deref()
        .context("PUBLIC_URL is required for webhook transport")?;
    client
        .set_webhook(&format!("{public_url}{}", config.webhook_path()))
        .await?;
    info!("Webhook registered");

    let state = WebhookState {
        token: config.bot_token.as_str().into(),
        dispatcher,
    };
    routes::serve(&config.host, config.port, routes::app(Some(state))).await
}
