//! Registration, token login/logout and the current user.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use little_lemon_core::{Group, UserId, Username};

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::{Caller, token_from_headers};
use crate::services::{AuthService, ServiceError, current_user};
use crate::state::AppState;

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// The current user with their staff groups.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: UserId,
    pub username: Username,
    pub email: Option<String>,
    pub groups: Vec<Group>,
}

/// Register a new customer account.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.store())
        .register(&form.username, &form.password, form.email.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange a username and password for a token.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let auth_token = AuthService::new(state.store())
        .login(&form.username, &form.password)
        .await?;

    Ok(Json(TokenResponse { auth_token }))
}

/// Revoke the token the request was made with.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let token = token_from_headers(&headers)
        .filter(|t| !t.is_empty())
        .ok_or(ServiceError::Unauthenticated)?;

    AuthService::new(state.store()).logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's account.
#[instrument(skip_all)]
pub async fn me(caller: Caller) -> Result<Json<MeResponse>> {
    let identity = current_user(caller.identity())?;

    Ok(Json(MeResponse {
        id: identity.user.id,
        username: identity.user.username.clone(),
        email: identity.user.email.clone(),
        groups: identity.groups.clone(),
    }))
}
