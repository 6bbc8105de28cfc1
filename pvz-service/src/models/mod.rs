//! Domain models for pvz-service.

mod product;
mod pvz;
mod reception;
mod user;

pub use product::{Product, ProductType};
pub use pvz::{City, Pagination, PickupPoint, PickupPointFilter, PickupPointSummary};
pub use reception::{Reception, ReceptionStatus, ReceptionWithProducts};
pub use user::{Role, User};

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

/// A stored or submitted value that is not one of an enumeration's variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Current time at the precision PostgreSQL stores (microseconds).
pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
