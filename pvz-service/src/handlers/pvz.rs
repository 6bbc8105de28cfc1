use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::SubsecRound;

use super::ApiError;
use crate::dtos::{CreatePvzRequest, PvzListQuery};
use crate::middleware::AuthUser;
use crate::models::{PickupPoint, PickupPointFilter, PickupPointSummary, Role};
use crate::services::metrics::PVZ_CREATED;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// Register a pickup point (moderators only).
pub async fn create_pvz(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePvzRequest>,
) -> Result<(StatusCode, Json<PickupPoint>), ApiError> {
    user.require_role(Role::Moderator)?;

    let mut pvz = PickupPoint::new(req.city);
    if let Some(id) = req.id {
        pvz.id = id;
    }
    if let Some(registration_date) = req.registration_date {
        pvz.registration_date = registration_date.trunc_subsecs(6);
    }

    let pvz = state.pvz.create_pickup_point(pvz).await?;
    PVZ_CREATED.inc();

    Ok((StatusCode::CREATED, Json(pvz)))
}

/// Pickup points with receptions and products, filtered and paginated.
pub async fn list_pvz(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PvzListQuery>,
) -> Result<Json<Vec<PickupPointSummary>>, ApiError> {
    let filter = PickupPointFilter::try_from(query)?;
    let summaries = state.pvz.list_pickup_point_summaries(&filter).await?;
    Ok(Json(summaries))
}
