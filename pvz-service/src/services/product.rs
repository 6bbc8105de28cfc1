//! Product mutations, gated on the owning reception being open.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::Product;
use crate::repository::{ProductStore, ReceptionStore, RECEPTION_CLOSED};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    receptions: Arc<dyn ReceptionStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, receptions: Arc<dyn ReceptionStore>) -> Self {
        Self {
            products,
            receptions,
        }
    }

    async fn ensure_open(&self, reception_id: Uuid) -> Result<(), AppError> {
        if self.receptions.is_open(reception_id).await? {
            Ok(())
        } else {
            info!(reception_id = %reception_id, "Rejected, reception is not open");
            Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_CLOSED)))
        }
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, reception_id = %product.reception_id))]
    pub async fn add_product(&self, product: Product) -> Result<Product, AppError> {
        self.ensure_open(product.reception_id).await?;
        self.products.append_product(&product).await?;

        info!(product_type = %product.product_type, "Product added");
        Ok(product)
    }

    /// Remove the newest product of the reception (LIFO).
    #[instrument(skip(self))]
    pub async fn remove_last_product(&self, reception_id: Uuid) -> Result<Product, AppError> {
        self.ensure_open(reception_id).await?;
        let removed = self.products.remove_most_recent_product(reception_id).await?;

        info!(product_id = %removed.id, "Product removed");
        Ok(removed)
    }

    /// Products of an open reception, oldest first.
    #[instrument(skip(self))]
    pub async fn list_products(&self, reception_id: Uuid) -> Result<Vec<Product>, AppError> {
        self.ensure_open(reception_id).await?;
        self.products.list_products(reception_id).await
    }
}
