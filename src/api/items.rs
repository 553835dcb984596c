use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::ApiKeyPrincipal;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{validate_description, validate_pagination, validate_title};
use super::{ApiError, AppState, ItemPublic, ItemQuery, Message, Page};
use crate::db::{Creatable, Deletable, Readable, Updatable};
use crate::models::{ItemCreate, ItemUpdate};

fn item_not_found() -> ApiError {
    ApiError::not_found("Item not found")
}

/// GET /items/
/// With `?title=` only exact title matches are listed and counted.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> Result<Json<Page<ItemPublic>>, ApiError> {
    let (offset, limit) = validate_pagination(query.skip, query.limit)?;
    let items = state.store().items();

    if let Some(title) = query.title {
        let matches = items.get_by_title(&title).await?;
        let count = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let rows = matches
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        return Ok(Json(Page::new(rows, count)));
    }

    let count = items.count().await?;
    let rows = items.list(offset, limit).await?;

    Ok(Json(Page::new(rows, count)))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ItemPublic>, ApiError> {
    let item = state
        .store()
        .items()
        .get(id)
        .await?
        .ok_or_else(item_not_found)?;

    Ok(Json(item.into()))
}

/// POST /items/
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(ApiKeyPrincipal(key)): Extension<ApiKeyPrincipal>,
    ApiJson(input): ApiJson<ItemCreate>,
) -> Result<(StatusCode, Json<ItemPublic>), ApiError> {
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;

    let item = state.store().items().create(input).await?;
    tracing::info!(item_id = %item.id, api_key_id = %key.id, "Item created");

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /items/{id}
/// Applies only the fields present in the body.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ItemUpdate>,
) -> Result<Json<ItemPublic>, ApiError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description.as_deref())?;
    }

    let items = state.store().items();
    let item = items.get(id).await?.ok_or_else(item_not_found)?;
    let item = items.update(item, patch).await?;

    Ok(Json(item.into()))
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(ApiKeyPrincipal(key)): Extension<ApiKeyPrincipal>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, ApiError> {
    state
        .store()
        .items()
        .remove(id)
        .await?
        .ok_or_else(item_not_found)?;

    tracing::info!(item_id = %id, api_key_id = %key.id, "Item deleted");
    Ok(Json(Message::new("Item deleted successfully")))
}
