//! Persistence seams for pvz-service.
//!
//! Each entity gets its own store trait. `Database` implements all of them
//! against PostgreSQL; [`MemoryStore`] implements them in-process with the
//! same invariants, for tests and local experiments.
//!
//! Error contract shared by every implementation:
//! - `AppError::Conflict` for invariant violations (second open reception,
//!   mutation of a closed reception, duplicate email)
//! - `AppError::NotFound` for a missing parent or nothing left to remove
//! - `AppError::DatabaseError` for storage failures

mod memory;
mod postgres;

pub use memory::MemoryStore;

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{PickupPoint, PickupPointFilter, Product, Reception, User};
use crate::services::Database;

/// Message carried by the conflict raised for a second open reception.
pub const RECEPTION_ALREADY_OPEN: &str = "reception already open";
/// Message carried by the conflict raised when closing a closed reception.
pub const RECEPTION_ALREADY_CLOSED: &str = "reception already closed";
/// Message carried by the conflict raised when mutating a closed reception.
pub const RECEPTION_CLOSED: &str = "reception is closed, unable to interact";

#[async_trait]
pub trait PvzStore: Send + Sync {
    async fn create_pvz(&self, pvz: &PickupPoint) -> Result<(), AppError>;

    /// Pickup points inside the filter window, newest registration first, one page.
    async fn list_pvz(&self, filter: &PickupPointFilter) -> Result<Vec<PickupPoint>, AppError>;

    /// Every pickup point, newest registration first.
    async fn list_all_pvz(&self) -> Result<Vec<PickupPoint>, AppError>;
}

#[async_trait]
pub trait ReceptionStore: Send + Sync {
    /// Insert a reception. A second open reception for the same point is a conflict.
    async fn create_reception(&self, reception: &Reception) -> Result<(), AppError>;

    /// Reception with the latest start time for the point, if any.
    async fn get_most_recent(&self, pvz_id: Uuid) -> Result<Option<Reception>, AppError>;

    /// All receptions for the point, most recent first.
    async fn get_all_for_pvz(&self, pvz_id: Uuid) -> Result<Vec<Reception>, AppError>;

    /// True iff the reception exists and is open.
    async fn is_open(&self, reception_id: Uuid) -> Result<bool, AppError>;

    /// Close the most recent reception of the point and return it.
    async fn close_most_recent(&self, pvz_id: Uuid) -> Result<Reception, AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product. The owning reception must exist and be open.
    async fn append_product(&self, product: &Product) -> Result<(), AppError>;

    /// Delete and return the newest product of the reception.
    async fn remove_most_recent_product(&self, reception_id: Uuid) -> Result<Product, AppError>;

    /// Products of the reception, oldest first.
    async fn list_products(&self, reception_id: Uuid) -> Result<Vec<Product>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn user_exists(&self, email: &str) -> Result<bool, AppError>;
}

/// Liveness of the backing store, for readiness probes.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
}

/// The full set of stores the services are wired with.
#[derive(Clone)]
pub struct Stores {
    pub pvz: Arc<dyn PvzStore>,
    pub receptions: Arc<dyn ReceptionStore>,
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    /// Stores backed by PostgreSQL.
    pub fn postgres(db: Arc<Database>) -> Self {
        Self {
            pvz: db.clone(),
            receptions: db.clone(),
            products: db.clone(),
            users: db.clone(),
            health: db,
        }
    }

    /// Stores backed by a fresh in-process [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::default()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            pvz: store.clone(),
            receptions: store.clone(),
            products: store.clone(),
            users: store.clone(),
            health: store,
        }
    }
}
