//! Pickup point model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{now_utc, ReceptionWithProducts, UnknownVariant};

/// Cities a pickup point may be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "Москва")]
    Moscow,
    #[serde(rename = "Санкт-Петербург")]
    SaintPetersburg,
    #[serde(rename = "Казань")]
    Kazan,
}

impl City {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moscow => "Москва",
            Self::SaintPetersburg => "Санкт-Петербург",
            Self::Kazan => "Казань",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for City {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Москва" => Ok(Self::Moscow),
            "Санкт-Петербург" => Ok(Self::SaintPetersburg),
            "Казань" => Ok(Self::Kazan),
            other => Err(UnknownVariant::new("city", other)),
        }
    }
}

impl TryFrom<String> for City {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Registered pickup point.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub id: Uuid,
    pub registration_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub city: City,
}

impl PickupPoint {
    /// New pickup point registered now.
    pub fn new(city: City) -> Self {
        Self {
            id: Uuid::new_v4(),
            registration_date: now_utc(),
            city,
        }
    }
}

/// Page selection for listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 30;

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Registration-date window (inclusive on both ends) plus paging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupPointFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub pagination: Pagination,
}

impl PickupPointFilter {
    /// Whether a registration date falls inside the window.
    pub fn matches(&self, registration_date: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| registration_date >= start)
            && self.end_date.map_or(true, |end| registration_date <= end)
    }
}

/// A pickup point with its receptions (most recent first) and their products.
#[derive(Debug, Clone, Serialize)]
pub struct PickupPointSummary {
    pub pvz: PickupPoint,
    pub receptions: Vec<ReceptionWithProducts>,
}
