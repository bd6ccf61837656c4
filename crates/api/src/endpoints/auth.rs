//! Authentication endpoints.

use axum::{Router, extract::State, routing::post};
use formkit_common::AppResult;
use formkit_core::CredentialsInput;
use formkit_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::{AppJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Account and token, as returned by signup and signin.
#[derive(Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl From<user::Model> for TokenResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            token: user.token.unwrap_or_default(),
        }
    }
}

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<CredentialsInput>,
) -> AppResult<Created<TokenResponse>> {
    let user = state.user_service.create(req).await?;
    Ok(Created(user.into()))
}

/// Exchange a username and password for a token.
async fn token(
    State(state): State<AppState>,
    AppJson(req): AppJson<CredentialsInput>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(ApiResponse::ok(user.into()))
}

/// Signout response.
#[derive(Serialize)]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out (invalidate current token by regenerating).
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SignoutResponse>> {
    state.user_service.regenerate_token(&user.id).await?;

    Ok(ApiResponse::ok(SignoutResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
        .route("/signout", post(signout))
}
