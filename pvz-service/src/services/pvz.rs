//! Pickup point registration and listing.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{PickupPoint, PickupPointFilter, PickupPointSummary, ReceptionWithProducts};
use crate::repository::{ProductStore, PvzStore, ReceptionStore};

#[derive(Clone)]
pub struct PvzService {
    pvz: Arc<dyn PvzStore>,
    receptions: Arc<dyn ReceptionStore>,
    products: Arc<dyn ProductStore>,
}

impl PvzService {
    pub fn new(
        pvz: Arc<dyn PvzStore>,
        receptions: Arc<dyn ReceptionStore>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            pvz,
            receptions,
            products,
        }
    }

    #[instrument(skip(self, pvz), fields(pvz_id = %pvz.id, city = %pvz.city))]
    pub async fn create_pickup_point(&self, pvz: PickupPoint) -> Result<PickupPoint, AppError> {
        self.pvz.create_pvz(&pvz).await?;
        info!("Pickup point registered");
        Ok(pvz)
    }

    /// Every registered pickup point, newest first.
    #[instrument(skip(self))]
    pub async fn list_pickup_points(&self) -> Result<Vec<PickupPoint>, AppError> {
        self.pvz.list_all_pvz().await
    }

    /// One page of pickup points with their receptions and products.
    ///
    /// Products are read straight from the store: closed receptions are
    /// reported too, unlike `ProductService::list_products`.
    #[instrument(skip(self))]
    pub async fn list_pickup_point_summaries(
        &self,
        filter: &PickupPointFilter,
    ) -> Result<Vec<PickupPointSummary>, AppError> {
        let points = self.pvz.list_pvz(filter).await?;

        let mut summaries = Vec::with_capacity(points.len());
        for pvz in points {
            let receptions = self.receptions.get_all_for_pvz(pvz.id).await?;

            let mut with_products = Vec::with_capacity(receptions.len());
            for reception in receptions {
                let products = self.products.list_products(reception.id).await?;
                with_products.push(ReceptionWithProducts {
                    reception,
                    products,
                });
            }

            summaries.push(PickupPointSummary {
                pvz,
                receptions: with_products,
            });
        }

        Ok(summaries)
    }
}
