//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Map, Value};
use shared::models::CategoryCreate;
use shared::{Category, DeleteResponse, ErrorCode};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/categories - top-level categories with their subcategories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.store.menu().await?.categories))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    let doc = state.store.menu().await?;
    let category = doc
        .find_category(&id)
        .cloned()
        .ok_or_else(|| AppError::category_not_found(&id))?;
    Ok(Json(category))
}

/// POST /api/categories - id and name required; ids are unique across the tree
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<(StatusCode, Json<Category>)> {
    payload.validate()?;
    let category = payload.into_category();

    let created = state
        .store
        .update_menu(|doc| {
            if doc.contains_category(&category.id) {
                return Err(AppError::with_message(
                    ErrorCode::CategoryIdExists,
                    format!("Category '{}' already exists", category.id),
                )
                .with_detail("categoryId", category.id.clone()));
            }
            doc.categories.push(category.clone());
            Ok(category)
        })
        .await?;

    tracing::info!(category = %created.id, "Category created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/categories/{id} - shallow merge; items and subcategories are kept
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> AppResult<Json<Category>> {
    let updated = state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category_mut(&id)
                .ok_or_else(|| AppError::category_not_found(&id))?;
            let merged = category
                .merged(&patch)
                .map_err(|e| AppError::validation(format!("Invalid category update: {}", e)))?;
            if merged.name.is_blank() {
                return Err(AppError::validation("Category name must not be empty"));
            }
            *category = merged.clone();
            Ok(merged)
        })
        .await?;

    tracing::info!(category = %id, "Category updated");
    Ok(Json(updated))
}

/// DELETE /api/categories/{id} - refused while the category holds products
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category(&id)
                .ok_or_else(|| AppError::category_not_found(&id))?;
            let count = category.product_count();
            if count > 0 {
                return Err(AppError::with_message(
                    ErrorCode::CategoryHasProducts,
                    format!("Category '{}' still has {} products", id, count),
                )
                .with_detail("productCount", count));
            }
            doc.remove_category(&id);
            Ok(())
        })
        .await?;

    tracing::info!(category = %id, "Category deleted");
    Ok(Json(DeleteResponse {
        success: true,
        id,
    }))
}
