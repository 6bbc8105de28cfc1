//! Reception (intake session) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{now_utc, Product, UnknownVariant};

/// Reception status. `InProgress` is the only state in which products may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    InProgress,
    #[serde(rename = "close")]
    Closed,
}

impl ReceptionStatus {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Closed => "close",
        }
    }
}

impl fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReceptionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "close" => Ok(Self::Closed),
            other => Err(UnknownVariant::new("reception status", other)),
        }
    }
}

impl TryFrom<String> for ReceptionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Intake session at a pickup point.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reception {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    pub pvz_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ReceptionStatus,
}

impl Reception {
    /// New open reception started now.
    pub fn open(pvz_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_time: now_utc(),
            pvz_id,
            status: ReceptionStatus::InProgress,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }
}

/// A reception together with its products, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ReceptionWithProducts {
    pub reception: Reception,
    pub products: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reception_is_open() {
        let pvz_id = Uuid::new_v4();
        let reception = Reception::open(pvz_id);
        assert!(reception.is_open());
        assert_eq!(reception.pvz_id, pvz_id);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReceptionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&ReceptionStatus::Closed).unwrap(),
            "\"close\""
        );
        assert_eq!("close".parse::<ReceptionStatus>().unwrap(), ReceptionStatus::Closed);
        assert!("closed".parse::<ReceptionStatus>().is_err());
    }

    #[test]
    fn test_reception_serializes_camel_case() {
        let value = serde_json::to_value(Reception::open(Uuid::new_v4())).unwrap();
        assert!(value.get("pvzId").is_some());
        assert!(value.get("dateTime").is_some());
        assert_eq!(value["status"], "in_progress");
    }
}
