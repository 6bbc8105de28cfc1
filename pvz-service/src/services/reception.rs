//! Reception lifecycle: `NoReception -> Open -> Closed`.
//!
//! At most one reception per pickup point is open at any time. The check
//! here rejects the common case early; the store closes the race between
//! two concurrent starts.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::Reception;
use crate::repository::{ReceptionStore, RECEPTION_ALREADY_CLOSED, RECEPTION_ALREADY_OPEN};

#[derive(Clone)]
pub struct ReceptionService {
    receptions: Arc<dyn ReceptionStore>,
}

impl ReceptionService {
    pub fn new(receptions: Arc<dyn ReceptionStore>) -> Self {
        Self { receptions }
    }

    /// Open a new reception at the pickup point.
    #[instrument(skip(self), fields(pvz_id = %pvz_id))]
    pub async fn start_reception(&self, pvz_id: Uuid) -> Result<Reception, AppError> {
        if let Some(last) = self.receptions.get_most_recent(pvz_id).await? {
            if last.is_open() {
                info!(reception_id = %last.id, "Start rejected, reception already open");
                return Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_OPEN)));
            }
        }

        let reception = Reception::open(pvz_id);
        self.receptions.create_reception(&reception).await?;

        info!(reception_id = %reception.id, "Reception started");
        Ok(reception)
    }

    /// Close the pickup point's most recent reception, provided `reception_id` is open.
    #[instrument(skip(self), fields(reception_id = %reception_id, pvz_id = %pvz_id))]
    pub async fn close_reception(
        &self,
        reception_id: Uuid,
        pvz_id: Uuid,
    ) -> Result<Reception, AppError> {
        if !self.receptions.is_open(reception_id).await? {
            info!("Close rejected, reception already closed");
            return Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_CLOSED)));
        }

        let closed = self.receptions.close_most_recent(pvz_id).await?;

        info!(closed_reception_id = %closed.id, "Reception closed");
        Ok(closed)
    }

    /// Most recent reception of the point; `NotFound` if it never had one.
    #[instrument(skip(self))]
    pub async fn get_last_reception(&self, pvz_id: Uuid) -> Result<Reception, AppError> {
        self.receptions.get_most_recent(pvz_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("no receptions for pickup point {}", pvz_id))
        })
    }

    /// All receptions of the point, most recent first.
    #[instrument(skip(self))]
    pub async fn get_receptions_for_point(&self, pvz_id: Uuid) -> Result<Vec<Reception>, AppError> {
        self.receptions.get_all_for_pvz(pvz_id).await
    }
}
