//! Read-only views scoped to one form.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use formkit_common::AppResult;
use formkit_core::FormAnalytics;
use formkit_db::entities::{question, response};

use crate::{middleware::AppState, response::ApiResponse};

/// Questions of a form in display order. Empty when it has none.
async fn form_questions(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> AppResult<ApiResponse<Vec<question::Model>>> {
    let questions = state.form_service.questions(&form_id).await?;
    Ok(ApiResponse::ok(questions))
}

async fn form_responses(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> AppResult<ApiResponse<Vec<response::Model>>> {
    let responses = state.response_service.list_for_form(&form_id).await?;
    Ok(ApiResponse::ok(responses))
}

/// Top answers per question, keyed by question id.
async fn response_analytics(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> AppResult<ApiResponse<FormAnalytics>> {
    let analytics = state.analytics_service.compute(&form_id).await?;
    Ok(ApiResponse::ok(analytics))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/form_questions/{form_id}", get(form_questions))
        .route("/form_responses/{form_id}", get(form_responses))
        .route("/response_analytics/{form_id}", get(response_analytics))
}
