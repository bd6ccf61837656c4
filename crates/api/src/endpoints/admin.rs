//! Owner views.

use axum::{Router, extract::State, routing::get};
use formkit_common::AppResult;
use formkit_db::entities::form;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Forms created by the caller, newest first.
async fn my_forms(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<form::Model>>> {
    let forms = state.form_service.list_owned(&user.id).await?;
    Ok(ApiResponse::ok(forms))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/forms", get(my_forms))
}
