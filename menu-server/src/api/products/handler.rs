//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::models::ProductCreate;
use shared::{DeleteResponse, MenuDocument, Product};
use uuid::Uuid;
use validator::Validate;

use crate::api::settings::video_mapping_list;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub action: Option<String>,
}

/// GET /api/products - whole document; `?action=version_check` gives its
/// version, `?action=get_video_mappings` the background video table
pub async fn get_menu(
    State(state): State<ServerState>,
    Query(query): Query<ProductsQuery>,
) -> AppResult<Response> {
    match query.action.as_deref() {
        None => Ok(Json(state.store.menu().await?).into_response()),
        Some("version_check") => Ok(Json(state.store.version_check().await?).into_response()),
        Some("get_video_mappings") => {
            let table = state.store.video_mappings().await?;
            Ok(Json(video_mapping_list(table)).into_response())
        }
        Some(other) => Err(AppError::invalid_request(format!("Unknown action '{}'", other))),
    }
}

/// PUT /api/products - replace the whole document
pub async fn replace_menu(
    State(state): State<ServerState>,
    Json(doc): Json<MenuDocument>,
) -> AppResult<Json<MenuDocument>> {
    let stored = state.store.replace_menu(doc).await?;
    tracing::info!(categories = stored.categories.len(), "Menu replaced");
    Ok(Json(stored))
}

/// Price every product with a non-blank brand; returns how many changed
fn set_branded_prices(items: &mut [Product], price: Decimal) -> usize {
    let mut count = 0;
    for product in items
        .iter_mut()
        .filter(|p| p.brand.as_deref().is_some_and(|b| !b.trim().is_empty()))
    {
        product.price = Some(price);
        count += 1;
    }
    count
}

/// POST /api/products/{category_id}/items - add a product, id assigned here
pub async fn create(
    State(state): State<ServerState>,
    Path(category_id): Path<String>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    payload.validate()?;
    let product = payload.into_product(Uuid::new_v4().to_string());

    let created = state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category_mut(&category_id)
                .ok_or_else(|| AppError::category_not_found(&category_id))?;
            category.items.push(product.clone());
            Ok(product)
        })
        .await?;

    tracing::info!(category = %category_id, product = %created.id, "Product added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/products/{category_id}/items/{item_id} - shallow merge
pub async fn update(
    State(state): State<ServerState>,
    Path((category_id, item_id)): Path<(String, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> AppResult<Json<Product>> {
    let updated = state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category_mut(&category_id)
                .ok_or_else(|| AppError::category_not_found(&category_id))?;
            let product = category
                .items
                .iter_mut()
                .find(|p| p.id == item_id)
                .ok_or_else(|| AppError::product_not_found(&item_id))?;
            let merged = product
                .merged(&patch)
                .map_err(|e| AppError::validation(format!("Invalid product update: {}", e)))?;
            *product = merged.clone();
            Ok(merged)
        })
        .await?;

    tracing::info!(category = %category_id, product = %item_id, "Product updated");
    Ok(Json(updated))
}

/// DELETE /api/products/{category_id}/items/{item_id}
pub async fn delete(
    State(state): State<ServerState>,
    Path((category_id, item_id)): Path<(String, String)>,
) -> AppResult<Json<DeleteResponse>> {
    state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category_mut(&category_id)
                .ok_or_else(|| AppError::category_not_found(&category_id))?;
            let pos = category
                .items
                .iter()
                .position(|p| p.id == item_id)
                .ok_or_else(|| AppError::product_not_found(&item_id))?;
            category.items.remove(pos);
            Ok(())
        })
        .await?;

    tracing::info!(category = %category_id, product = %item_id, "Product deleted");
    Ok(Json(DeleteResponse {
        success: true,
        id: item_id,
    }))
}

/// PUT /api/products/move/{from}/{item_id}/{to}
pub async fn move_product(
    State(state): State<ServerState>,
    Path((from, item_id, to)): Path<(String, String, String)>,
) -> AppResult<Json<Product>> {
    let moved = state
        .store
        .update_menu(|doc| {
            if !doc.contains_category(&to) {
                return Err(AppError::category_not_found(&to));
            }
            let source = doc
                .find_category_mut(&from)
                .ok_or_else(|| AppError::category_not_found(&from))?;
            let pos = source
                .items
                .iter()
                .position(|p| p.id == item_id)
                .ok_or_else(|| AppError::product_not_found(&item_id))?;
            let product = source.items.remove(pos);

            let target = doc
                .find_category_mut(&to)
                .ok_or_else(|| AppError::category_not_found(&to))?;
            target.items.push(product.clone());
            Ok(product)
        })
        .await?;

    tracing::info!(product = %item_id, from = %from, to = %to, "Product moved");
    Ok(Json(moved))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPriceRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub new_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPriceResponse {
    pub updated_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_price: Decimal,
}

/// PUT /api/products/{category_id}/bulk-price
///
/// Sets the price of every branded product (the tobacco lines) in one
/// category.
pub async fn bulk_price(
    State(state): State<ServerState>,
    Path(category_id): Path<String>,
    Json(req): Json<BulkPriceRequest>,
) -> AppResult<Json<BulkPriceResponse>> {
    if req.new_price.is_sign_negative() {
        return Err(AppError::new(shared::ErrorCode::ProductInvalidPrice));
    }
    let new_price = req.new_price;

    let updated_count = state
        .store
        .update_menu(|doc| {
            let category = doc
                .find_category_mut(&category_id)
                .ok_or_else(|| AppError::category_not_found(&category_id))?;
            Ok(set_branded_prices(&mut category.items, new_price))
        })
        .await?;

    tracing::info!(category = %category_id, updated_count, "Bulk price update");
    Ok(Json(BulkPriceResponse {
        updated_count,
        new_price,
    }))
}
