//! API endpoints.

mod admin;
mod answers;
mod auth;
mod form_views;
mod forms;
mod questions;
mod responses;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(form_views::router())
        .nest("/forms", forms::router())
        .nest("/admin", admin::router())
        .nest("/questions", questions::router())
        .nest("/responses", responses::router())
        .nest("/answers", answers::router())
}
