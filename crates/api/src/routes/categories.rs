//! Menu category handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use little_lemon_core::CategoryId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::Caller;
use crate::models::Category;
use crate::services::CatalogService;
use crate::state::AppState;

/// New category form.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub slug: String,
    pub title: String,
}

/// List every category.
#[instrument(skip(state, caller))]
pub async fn index(State(state): State<AppState>, caller: Caller) -> Result<Json<Vec<Category>>> {
    let categories = CatalogService::new(state.store())
        .list_categories(caller.identity())
        .await?;
    Ok(Json(categories))
}

/// Create a category.
#[instrument(skip(state, caller))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<impl IntoResponse> {
    let category = CatalogService::new(state.store())
        .create_category(caller.identity(), &form.slug, &form.title)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete an unused category.
#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CatalogService::new(state.store())
        .delete_category(caller.identity(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
