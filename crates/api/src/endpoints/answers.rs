//! Answer endpoints. Answers are written only through response submission.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use formkit_common::AppResult;
use formkit_db::entities::answer;
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub response: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<answer::Model>>> {
    let answers = state
        .response_service
        .list_answers(query.response.as_deref())
        .await?;
    Ok(ApiResponse::ok(answers))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<answer::Model>> {
    let answer = state.response_service.get_answer(&id).await?;
    Ok(ApiResponse::ok(answer))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
