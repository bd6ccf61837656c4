//! Response endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use formkit_common::AppResult;
use formkit_core::{ResponseWithAnswers, SubmitResponseInput, UpdateResponseInput};
use formkit_db::entities::response;
use serde::Deserialize;

use crate::{
    extractors::{AppJson, AuthUser, ClientInfo, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Created, ok},
};

/// `?form=<id>` filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub form: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<response::Model>>> {
    let responses = state.response_service.list(query.form.as_deref()).await?;
    Ok(ApiResponse::ok(responses))
}

/// Submit a response. Anonymous submissions are allowed.
async fn submit(
    MaybeAuthUser(user): MaybeAuthUser,
    client: ClientInfo,
    State(state): State<AppState>,
    AppJson(req): AppJson<SubmitResponseInput>,
) -> AppResult<Created<ResponseWithAnswers>> {
    let input = fill_from_request(req, user.map(|u| u.id), client);
    let response = state.response_service.submit(input).await?;
    Ok(Created(response))
}

/// Fill fields the client left out from what the request itself tells us.
fn fill_from_request(
    mut input: SubmitResponseInput,
    caller: Option<String>,
    client: ClientInfo,
) -> SubmitResponseInput {
    if input.submitted_by.is_none() {
        input.submitted_by = caller;
    }
    if input.ip_address.is_none() {
        input.ip_address = client.ip_address;
    }
    if input.user_agent.is_none() {
        input.user_agent = client.user_agent;
    }
    input
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ResponseWithAnswers>> {
    let response = state.response_service.get(&id).await?;
    Ok(ApiResponse::ok(response))
}

async fn replace(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateResponseInput>,
) -> AppResult<ApiResponse<response::Model>> {
    let response = state.response_service.replace(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(response))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateResponseInput>,
) -> AppResult<ApiResponse<response::Model>> {
    let response = state.response_service.update(&id, &user.id, req).await?;
    Ok(ApiResponse::ok(response))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.response_service.delete(&id, &user.id).await?;
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(submit)).route(
        "/{id}",
        get(show).put(replace).patch(update).delete(delete),
    )
}
