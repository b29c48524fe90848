//! Wiring: builds the collaborators and runs each concurrent activity as a
//! supervised task.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::error;

use crate::analyzer::EngineAnalyzer;
use crate::clients::telegram::TelegramClient;
use crate::clients::Messenger;
use crate::config::{Config, Transport};
use crate::dispatcher::Dispatcher;
use crate::handler::{HandlerSettings, PhotoRequestHandler};
use crate::recognition::CommandRecognizer;
use crate::routes;
use crate::supervisor::supervise;
use crate::transport;

/// Build the Bot API client and a dispatcher wired to the real recognizer
/// and engine.
pub fn build(config: &Config) -> anyhow::Result<(TelegramClient, Arc<Dispatcher>)> {
    let client = TelegramClient::new(&config.telegram_api_url, &config.bot_token)?;
    let messenger: Arc<dyn Messenger> = Arc::new(client.clone());

    let recognizer = Arc::new(CommandRecognizer::new(
        config.recognizer_path.clone(),
        config.recognizer_args.clone(),
        config.recognizer_timeout,
    ));
    let analyzer = Arc::new(EngineAnalyzer::new(
        config.engine_command.clone(),
        config.engine_options.clone(),
        config.search_limits,
    ));
    let handler = Arc::new(PhotoRequestHandler::new(
        messenger.clone(),
        recognizer,
        analyzer,
        HandlerSettings::from_config(config),
    ));

    Ok((client, Arc::new(Dispatcher::new(messenger, handler))))
}

async fn start_polling(config: Arc<Config>) -> anyhow::Result<()> {
    let (client, dispatcher) = build(&config)?;
    transport::polling::run(client, dispatcher).await
}

async fn start_webhook(config: Arc<Config>) -> anyhow::Result<()> {
    let (client, dispatcher) = build(&config)?;
    transport::webhook::run(&config, client, dispatcher).await
}

/// Run the bot until every supervised task has finished.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let backoff = config.restart_backoff;
    let mut tasks = JoinSet::new();

    if let (Some(interval), Some(url)) = (config.keepalive_interval, config.public_url.clone()) {
        tasks.spawn(supervise("keepalive", backoff, move || {
            transport::keepalive::run(url.clone(), interval)
        }));
    }

    match config.transport {
        Transport::Polling => {
            let health_config = config.clone();
            tasks.spawn(supervise("health", backoff, move || {
                let config = health_config.clone();
                async move { routes::serve(&config.host, config.port, routes::app(None)).await }
            }));

            let bot_config = config.clone();
            tasks.spawn(supervise("bot", backoff, move || start_polling(bot_config.clone())));
        }
        Transport::Webhook => {
            let bot_config = config.clone();
            tasks.spawn(supervise("webhook", backoff, move || start_webhook(bot_config.clone())));
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Supervised task aborted");
        }
    }
    Ok(())
}
