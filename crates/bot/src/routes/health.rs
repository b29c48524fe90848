use axum::response::Html;

const STATUS_PAGE: &str = "<!doctype html>\
<html><head><title>BoardSight</title></head>\
<body><h1>BoardSight is running</h1><p>Send a chessboard photo to the bot to get an evaluation.</p></body></html>";

/// GET / (HEAD is answered by axum with the same status and no body)
pub async fn health_check() -> Html<&'static str> {
    Html(STATUS_PAGE)
}
