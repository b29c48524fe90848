pub mod health;
pub mod webhook;

use anyhow::Context;
use axum::{
    routing::{any, get},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use webhook::WebhookState;

/// Health page, plus the webhook route when running in webhook mode.
pub fn app(webhook: Option<WebhookState>) -> Router {
    let router = Router::new().route("/", get(health::health_check));

    let router = match webhook {
        Some(state) => router
            .route("/{token}", any(webhook::receive_update))
            .layer(Extension(state)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Bind and serve until the server fails.
pub async fn serve(host: &str, port: u16, app: Router) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Starting HTTP server on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
