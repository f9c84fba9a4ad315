//! Manager and delivery crew roster handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use little_lemon_core::{Group, Page, RosterOrdering};

use super::page_request;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::Caller;
use crate::models::User;
use crate::services::RosterService;
use crate::state::AppState;

/// Roster listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RosterParams {
    /// `username` or `-username`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub perpage: Option<u32>,
}

/// Member to add.
#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub username: String,
}

/// Confirmation of a roster change.
#[derive(Debug, Serialize)]
pub struct RosterMessage {
    pub message: String,
}

fn group(segment: &str) -> Result<Group> {
    Group::lookup(segment).ok_or_else(|| AppError::NotFound(format!("No group named {segment}")))
}

/// One page of a group's members.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(segment): ApiPath<String>,
    ApiQuery(params): ApiQuery<RosterParams>,
) -> Result<Json<Page<User>>> {
    let group = group(&segment)?;
    let ordering = params
        .ordering
        .as_deref()
        .filter(|o| !o.trim().is_empty())
        .map(str::parse::<RosterOrdering>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let page = page_request(&state, params.page, params.perpage)?;

    let members = RosterService::new(state.store())
        .list(caller.identity(), group, ordering, page)
        .await?;
    Ok(Json(members))
}

/// Add a user to a group.
#[instrument(skip(state, caller))]
pub async fn add(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(segment): ApiPath<String>,
    ApiJson(form): ApiJson<MemberForm>,
) -> Result<impl IntoResponse> {
    let group = group(&segment)?;
    let user = RosterService::new(state.store())
        .add(caller.identity(), group, &form.username)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RosterMessage {
            message: format!("user {} added to group {group}", user.username),
        }),
    ))
}

/// Remove a user from a group.
#[instrument(skip(state, caller))]
pub async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath((segment, username)): ApiPath<(String, String)>,
) -> Result<Json<RosterMessage>> {
    let group = group(&segment)?;
    let user = RosterService::new(state.store())
        .remove(caller.identity(), group, &username)
        .await?;

    Ok(Json(RosterMessage {
        message: format!("user {} removed from group {group}", user.username),
    }))
}
