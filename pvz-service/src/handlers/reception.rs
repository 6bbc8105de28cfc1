use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiError;
use crate::dtos::CreateReceptionRequest;
use crate::middleware::AuthUser;
use crate::models::{Reception, Role};
use crate::services::metrics::RECEPTIONS_CREATED;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// Open a reception at a pickup point (employees only).
pub async fn create_reception(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateReceptionRequest>,
) -> Result<(StatusCode, Json<Reception>), ApiError> {
    user.require_role(Role::Employee)?;

    let reception = state.receptions.start_reception(req.pvz_id).await?;
    RECEPTIONS_CREATED.inc();

    Ok((StatusCode::CREATED, Json(reception)))
}

/// Close the last reception of a pickup point (employees only).
pub async fn close_last_reception(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pvz_id): Path<Uuid>,
) -> Result<Json<Reception>, ApiError> {
    user.require_role(Role::Employee)?;

    let last = state.receptions.get_last_reception(pvz_id).await?;
    let closed = state.receptions.close_reception(last.id, pvz_id).await?;

    Ok(Json(closed))
}
