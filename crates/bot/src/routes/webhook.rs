use std::sync::Arc;

use axum::{
    extract::Path,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};

use crate::clients::telegram::Update;
use crate::dispatcher::Dispatcher;

#[derive(Clone)]
pub struct WebhookState {
    pub token: Arc<str>,
    pub dispatcher: Arc<Dispatcher>,
}

/// POST /{token}: one update per request, dispatched before answering.
/// Anything else on this route is indistinguishable from an unknown path.
pub async fn receive_update(
    Path(token): Path<String>,
    method: Method,
    Extension(state): Extension<WebhookState>,
    body: String,
) -> Response {
    if method != Method::POST || token != *state.token {
        return StatusCode::NOT_FOUND.into_response();
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed webhook update");
            return (StatusCode::BAD_REQUEST, "invalid update").into_response();
        }
    };

    tracing::debug!(update_id = update.update_id, "Webhook update received");
    state.dispatcher.dispatch(update).await;
    "ok".into_response()
}
