//! Product model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{now_utc, UnknownVariant};

/// Product categories accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "электроника")]
    Electronics,
    #[serde(rename = "одежда")]
    Clothes,
    #[serde(rename = "обувь")]
    Shoes,
}

impl ProductType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "электроника",
            Self::Clothes => "одежда",
            Self::Shoes => "обувь",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "электроника" => Ok(Self::Electronics),
            "одежда" => Ok(Self::Clothes),
            "обувь" => Ok(Self::Shoes),
            other => Err(UnknownVariant::new("product type", other)),
        }
    }
}

impl TryFrom<String> for ProductType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Product registered during a reception.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub reception_id: Uuid,
}

impl Product {
    /// New product registered now under `reception_id`.
    pub fn new(product_type: ProductType, reception_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_time: now_utc(),
            product_type,
            reception_id,
        }
    }
}
