//! Form endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use formkit_common::AppResult;
use formkit_core::{CreateFormInput, FormWithQuestions, UpdateFormInput};
use formkit_db::entities::form;

use crate::{
    extractors::{AppJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Created, ok},
};

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<form::Model>>> {
    let forms = state.form_service.list().await?;
    Ok(ApiResponse::ok(forms))
}

/// Create a form owned by the caller.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateFormInput>,
) -> AppResult<Created<form::Model>> {
    let form = state.form_service.create(&user.id, req).await?;
    Ok(Created(form))
}

/// A form with its questions in display order.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FormWithQuestions>> {
    let form = state.form_service.get_with_questions(&id).await?;
    Ok(ApiResponse::ok(form))
}

async fn replace(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateFormInput>,
) -> AppResult<ApiResponse<form::Model>> {
    let form = state.form_service.replace(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(form))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateFormInput>,
) -> AppResult<ApiResponse<form::Model>> {
    let form = state.form_service.update(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(form))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.form_service.delete(&id, &user.id).await?;
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create)).route(
        "/{id}",
        get(show).put(replace).patch(update).delete(delete),
    )
}
