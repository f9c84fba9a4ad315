//! Cart handlers. Every route acts on the caller's own cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use little_lemon_core::{MenuItemId, Page};

use super::page_request;
use crate::error::Result;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::Caller;
use crate::models::CartLine;
use crate::services::CartService;
use crate::state::AppState;

/// Page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub perpage: Option<u32>,
}

/// Item to add to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    #[serde(alias = "menuitem")]
    pub menuitem_id: MenuItemId,
    pub quantity: i64,
}

/// One page of the caller's cart.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<CartLine>>> {
    let page = page_request(&state, params.page, params.perpage)?;
    let lines = CartService::new(state.store())
        .list(caller.identity(), page)
        .await?;
    Ok(Json(lines))
}

/// Add a menu item to the caller's cart.
#[instrument(skip(state, caller))]
pub async fn add(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(form): ApiJson<AddToCart>,
) -> Result<impl IntoResponse> {
    let line = CartService::new(state.store())
        .add(caller.identity(), form.menuitem_id, form.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Empty the caller's cart.
#[instrument(skip(state, caller))]
pub async fn clear(State(state): State<AppState>, caller: Caller) -> Result<StatusCode> {
    CartService::new(state.store())
        .clear(caller.identity())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
