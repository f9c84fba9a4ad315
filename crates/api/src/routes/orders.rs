//! Order handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use little_lemon_core::{OrderId, OrderPatch, Page};

use super::cart::PageParams;
use super::page_request;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::Caller;
use crate::models::{Order, OrderDetail};
use crate::services::OrderService;
use crate::state::AppState;

/// One page of the orders the caller may see.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Order>>> {
    let page = page_request(&state, params.page, params.perpage)?;
    let orders = OrderService::new(state.store())
        .list(caller.identity(), page)
        .await?;
    Ok(Json(orders))
}

/// Place an order from the caller's cart.
#[instrument(skip(state, caller))]
pub async fn create(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    let detail = OrderService::new(state.store())
        .place(caller.identity())
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// One of the caller's orders with its items.
#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderService::new(state.store())
        .get(caller.identity(), id)
        .await?;
    Ok(Json(detail))
}

/// Mark an order delivered or assign its delivery crew.
#[instrument(skip(state, caller))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.store())
        .update(caller.identity(), id, patch)
        .await?;
    Ok(Json(order))
}

/// Delete an order.
#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode> {
    OrderService::new(state.store())
        .delete(caller.identity(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
