//! Menu item handlers: listing, CRUD and the item of the day.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use little_lemon_core::{MenuItemId, MenuOrdering, MenuQuery, Page};

use super::page_request;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::Caller;
use crate::models::MenuItem;
use crate::services::{CatalogService, MenuItemInput, MenuItemPatch};
use crate::state::AppState;

/// Menu listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MenuParams {
    /// Substring of the category title.
    pub category: Option<String>,
    /// Exact item title.
    pub title: Option<String>,
    pub featured: Option<bool>,
    /// Whitespace-separated search terms.
    pub search: Option<String>,
    /// `title`, `price` or `category__title`, optionally prefixed with `-`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub perpage: Option<u32>,
}

impl MenuParams {
    fn query(&self) -> Result<MenuQuery> {
        let ordering = self
            .ordering
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .map(str::parse::<MenuOrdering>)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(MenuQuery {
            category: self.category.clone(),
            title: self.title.clone(),
            featured: self.featured,
            search: self.search.clone(),
            ordering,
        })
    }
}

/// One page of menu items.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(params): ApiQuery<MenuParams>,
) -> Result<Json<Page<MenuItem>>> {
    let query = params.query()?;
    let page = page_request(&state, params.page, params.perpage)?;

    let items = CatalogService::new(state.store())
        .list_menu_items(caller.identity(), query, page)
        .await?;
    Ok(Json(items))
}

/// Create a menu item.
#[instrument(skip(state, caller, input))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<impl IntoResponse> {
    let item = CatalogService::new(state.store())
        .create_menu_item(caller.identity(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// One menu item.
#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<MenuItemId>,
) -> Result<Json<MenuItem>> {
    let item = CatalogService::new(state.store())
        .get_menu_item(caller.identity(), id)
        .await?;
    Ok(Json(item))
}

/// Replace every field of a menu item.
#[instrument(skip(state, caller, input))]
pub async fn replace(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<MenuItemId>,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<Json<MenuItem>> {
    let item = CatalogService::new(state.store())
        .update_menu_item(caller.identity(), id, input.into())
        .await?;
    Ok(Json(item))
}

/// Change some fields of a menu item.
#[instrument(skip(state, caller, patch))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<MenuItemId>,
    ApiJson(patch): ApiJson<MenuItemPatch>,
) -> Result<Json<MenuItem>> {
    let item = CatalogService::new(state.store())
        .update_menu_item(caller.identity(), id, patch)
        .await?;
    Ok(Json(item))
}

/// Delete a menu item.
#[instrument(skip(state, caller))]
pub async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<MenuItemId>,
) -> Result<StatusCode> {
    CatalogService::new(state.store())
        .delete_menu_item(caller.identity(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make a menu item the item of the day.
#[instrument(skip(state, caller))]
pub async fn feature(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<MenuItemId>,
) -> Result<impl IntoResponse> {
    let item = CatalogService::new(state.store())
        .set_featured(caller.identity(), id)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_ordering_is_ignored() {
        let params = MenuParams {
            ordering: Some(" ".to_owned()),
            ..Default::default()
        };
        assert_eq!(params.query().unwrap().ordering, None);
    }

    #[test]
    fn test_unknown_ordering_is_rejected() {
        let params = MenuParams {
            ordering: Some("calories".to_owned()),
            ..Default::default()
        };
        assert!(matches!(params.query(), Err(AppError::BadRequest(_))));
    }
}
