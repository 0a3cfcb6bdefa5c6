//! HTTP endpoint handlers.

use axum::response::Html;

/// Serve the embedded browser client entry page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../../public/index.html"))
}
