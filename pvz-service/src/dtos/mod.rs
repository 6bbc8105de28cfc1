//! Request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{City, Pagination, PickupPointFilter, ProductType, Role};

#[derive(Debug, Deserialize, Validate)]
pub struct DummyLoginRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Moderators may supply the id and registration date; both default.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePvzRequest {
    pub id: Option<Uuid>,
    pub registration_date: Option<DateTime<Utc>>,
    pub city: City,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceptionRequest {
    pub pvz_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub pvz_id: Uuid,
}

/// Raw `GET /pvz` query string. Parsed by hand so bad values get JSON errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvzListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TryFrom<PvzListQuery> for PickupPointFilter {
    type Error = AppError;

    fn try_from(query: PvzListQuery) -> Result<Self, Self::Error> {
        let page = match non_empty(&query.page) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(bad_request("Invalid page parameter")),
            },
        };

        let limit = match non_empty(&query.limit) {
            None => Pagination::DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<u32>() {
                Ok(limit) if (1..=Pagination::MAX_LIMIT).contains(&limit) => limit,
                _ => return Err(bad_request("Invalid limit parameter")),
            },
        };

        Ok(PickupPointFilter {
            start_date: parse_date(&query.start_date, "Invalid startDate parameter")?,
            end_date: parse_date(&query.end_date, "Invalid endDate parameter")?,
            pagination: Pagination { page, limit },
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn parse_date(value: &Option<String>, message: &'static str) -> Result<Option<DateTime<Utc>>, AppError> {
    non_empty(value)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| bad_request(message))
        })
        .transpose()
}

fn bad_request(message: &'static str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(message))
}
