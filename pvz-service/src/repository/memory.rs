//! In-process implementation of the store traits.
//!
//! All state sits behind one mutex, so every operation is atomic with
//! respect to every other. Ordering ties (equal timestamps) resolve to
//! insertion order, matching the `seq` column of the SQL schema.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    ProductStore, PvzStore, ReceptionStore, StoreHealth, UserStore, RECEPTION_ALREADY_CLOSED,
    RECEPTION_ALREADY_OPEN, RECEPTION_CLOSED,
};
use crate::models::{
    PickupPoint, PickupPointFilter, Product, Reception, ReceptionStatus, User,
};

#[derive(Default)]
struct State {
    pvz: Vec<PickupPoint>,
    receptions: Vec<Reception>,
    products: Vec<Product>,
    users: HashMap<String, User>,
}

impl State {
    fn most_recent_index(&self, pvz_id: Uuid) -> Option<usize> {
        self.receptions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pvz_id == pvz_id)
            .max_by_key(|(_, r)| r.date_time)
            .map(|(idx, _)| idx)
    }

    fn require_open(&self, reception_id: Uuid) -> Result<(), AppError> {
        match self.receptions.iter().find(|r| r.id == reception_id) {
            None => Err(AppError::NotFound(anyhow::anyhow!(
                "reception {} not found",
                reception_id
            ))),
            Some(r) if r.is_open() => Ok(()),
            Some(_) => Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_CLOSED))),
        }
    }

    fn sorted_pvz(&self) -> Vec<PickupPoint> {
        let mut points = self.pvz.clone();
        points.sort_by(|a, b| {
            b.registration_date
                .cmp(&a.registration_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        points
    }
}

/// Mutex-guarded store holding every entity in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::DatabaseError(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl PvzStore for MemoryStore {
    async fn create_pvz(&self, pvz: &PickupPoint) -> Result<(), AppError> {
        let mut state = self.state()?;
        if state.pvz.iter().any(|p| p.id == pvz.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "pickup point {} already exists",
                pvz.id
            )));
        }
        state.pvz.push(pvz.clone());
        Ok(())
    }

    async fn list_pvz(&self, filter: &PickupPointFilter) -> Result<Vec<PickupPoint>, AppError> {
        let state = self.state()?;
        let offset = usize::try_from(filter.pagination.offset()).unwrap_or(usize::MAX);
        Ok(state
            .sorted_pvz()
            .into_iter()
            .filter(|p| filter.matches(p.registration_date))
            .skip(offset)
            .take(filter.pagination.limit as usize)
            .collect())
    }

    async fn list_all_pvz(&self) -> Result<Vec<PickupPoint>, AppError> {
        Ok(self.state()?.sorted_pvz())
    }
}

#[async_trait]
impl ReceptionStore for MemoryStore {
    async fn create_reception(&self, reception: &Reception) -> Result<(), AppError> {
        let mut state = self.state()?;
        if !state.pvz.iter().any(|p| p.id == reception.pvz_id) {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "pickup point {} not found",
                reception.pvz_id
            )));
        }
        if reception.is_open()
            && state
                .receptions
                .iter()
                .any(|r| r.pvz_id == reception.pvz_id && r.is_open())
        {
            return Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_OPEN)));
        }
        state.receptions.push(reception.clone());
        Ok(())
    }

    async fn get_most_recent(&self, pvz_id: Uuid) -> Result<Option<Reception>, AppError> {
        let state = self.state()?;
        Ok(state
            .most_recent_index(pvz_id)
            .map(|idx| state.receptions[idx].clone()))
    }

    async fn get_all_for_pvz(&self, pvz_id: Uuid) -> Result<Vec<Reception>, AppError> {
        let state = self.state()?;
        let mut receptions: Vec<(usize, Reception)> = state
            .receptions
            .iter()
            .cloned()
            .enumerate()
            .filter(|(_, r)| r.pvz_id == pvz_id)
            .collect();
        receptions.sort_by(|(ia, a), (ib, b)| b.date_time.cmp(&a.date_time).then(ib.cmp(ia)));
        Ok(receptions.into_iter().map(|(_, r)| r).collect())
    }

    async fn is_open(&self, reception_id: Uuid) -> Result<bool, AppError> {
        let state = self.state()?;
        Ok(state
            .receptions
            .iter()
            .any(|r| r.id == reception_id && r.is_open()))
    }

    async fn close_most_recent(&self, pvz_id: Uuid) -> Result<Reception, AppError> {
        let mut state = self.state()?;
        let idx = state.most_recent_index(pvz_id).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("no receptions for pickup point {}", pvz_id))
        })?;

        let reception = &mut state.receptions[idx];
        if !reception.is_open() {
            return Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_CLOSED)));
        }
        reception.status = ReceptionStatus::Closed;
        Ok(reception.clone())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn append_product(&self, product: &Product) -> Result<(), AppError> {
        let mut state = self.state()?;
        state.require_open(product.reception_id)?;
        state.products.push(product.clone());
        Ok(())
    }

    async fn remove_most_recent_product(&self, reception_id: Uuid) -> Result<Product, AppError> {
        let mut state = self.state()?;
        state.require_open(reception_id)?;

        let idx = state
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .max_by_key(|(_, p)| p.date_time)
            .map(|(idx, _)| idx)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("no products to remove")))?;

        Ok(state.products.remove(idx))
    }

    async fn list_products(&self, reception_id: Uuid) -> Result<Vec<Product>, AppError> {
        let state = self.state()?;
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.reception_id == reception_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        products.sort_by_key(|p| p.date_time);
        Ok(products)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.state()?;
        if state.users.contains_key(&user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "user with this email already exists"
            )));
        }
        state.users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.state()?.users.get(email).cloned())
    }

    async fn user_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.state()?.users.contains_key(email))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.state().map(|_| ())
    }
}
