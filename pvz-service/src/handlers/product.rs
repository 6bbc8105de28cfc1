use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiError;
use crate::dtos::AddProductRequest;
use crate::middleware::AuthUser;
use crate::models::{Product, Role};
use crate::services::metrics::PRODUCTS_ADDED;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// Add a product to the last reception of a pickup point (employees only).
pub async fn add_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<AddProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require_role(Role::Employee)?;

    let last = state.receptions.get_last_reception(req.pvz_id).await?;
    let product = state
        .products
        .add_product(Product::new(req.product_type, last.id))
        .await?;
    PRODUCTS_ADDED.inc();

    Ok((StatusCode::CREATED, Json(product)))
}

/// Remove the newest product from the last reception of a pickup point (employees only).
pub async fn delete_last_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pvz_id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    user.require_role(Role::Employee)?;

    let last = state.receptions.get_last_reception(pvz_id).await?;
    let removed = state.products.remove_last_product(last.id).await?;

    Ok(Json(removed))
}
