//! PostgreSQL implementation of the store traits.
//!
//! Concurrency rules live in the database:
//! - `receptions_one_open_per_pvz` (partial unique index) admits one open
//!   reception per pickup point, so concurrent starts cannot both win
//! - close, append and remove lock the affected reception row `FOR UPDATE`
//!   and re-check its status inside the same transaction
//! - receptions and products carry a `seq` column; equal timestamps resolve
//!   to insertion order

use async_trait::async_trait;
use service_core::error::AppError;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::{
    ProductStore, PvzStore, ReceptionStore, StoreHealth, UserStore, RECEPTION_ALREADY_CLOSED,
    RECEPTION_ALREADY_OPEN, RECEPTION_CLOSED,
};
use crate::models::{
    PickupPoint, PickupPointFilter, Product, Reception, ReceptionStatus, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::Database;

const OPEN_RECEPTION_INDEX: &str = "receptions_one_open_per_pvz";

fn db_error(operation: &str, e: sqlx::Error) -> AppError {
    error!(error = %e, operation = operation, "Database operation failed");
    AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", operation, e))
}

#[async_trait]
impl PvzStore for Database {
    #[instrument(skip(self, pvz), fields(pvz_id = %pvz.id, city = %pvz.city))]
    async fn create_pvz(&self, pvz: &PickupPoint) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_pvz"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO pvz (id, registration_date, city)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(pvz.id)
        .bind(pvz.registration_date)
        .bind(pvz.city.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("pickup point {} already exists", pvz.id))
            }
            _ => db_error("create pickup point", e),
        })?;

        timer.observe_duration();

        debug!("Pickup point created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_pvz(&self, filter: &PickupPointFilter) -> Result<Vec<PickupPoint>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_pvz"])
            .start_timer();

        let points = sqlx::query_as::<_, PickupPoint>(
            r#"
            SELECT id, registration_date, city
            FROM pvz
            WHERE ($1::timestamptz IS NULL OR registration_date >= $1)
              AND ($2::timestamptz IS NULL OR registration_date <= $2)
            ORDER BY registration_date DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(i64::from(filter.pagination.limit))
        .bind(filter.pagination.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_error("list pickup points", e))?;

        timer.observe_duration();

        Ok(points)
    }

    #[instrument(skip(self))]
    async fn list_all_pvz(&self) -> Result<Vec<PickupPoint>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_all_pvz"])
            .start_timer();

        let points = sqlx::query_as::<_, PickupPoint>(
            r#"
            SELECT id, registration_date, city
            FROM pvz
            ORDER BY registration_date DESC, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_error("list all pickup points", e))?;

        timer.observe_duration();

        Ok(points)
    }
}

#[async_trait]
impl ReceptionStore for Database {
    #[instrument(skip(self, reception), fields(reception_id = %reception.id, pvz_id = %reception.pvz_id))]
    async fn create_reception(&self, reception: &Reception) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_reception"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO receptions (id, date_time, pvz_id, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reception.id)
        .bind(reception.date_time)
        .bind(reception.pvz_id)
        .bind(reception.status.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(OPEN_RECEPTION_INDEX) =>
            {
                warn!("Concurrent start lost to an already open reception");
                AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_OPEN))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("pickup point {} not found", reception.pvz_id))
            }
            _ => db_error("create reception", e),
        })?;

        timer.observe_duration();

        debug!("Reception created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_most_recent(&self, pvz_id: Uuid) -> Result<Option<Reception>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_most_recent_reception"])
            .start_timer();

        let reception = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, date_time, pvz_id, status
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY date_time DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(pvz_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| db_error("get most recent reception", e))?;

        timer.observe_duration();

        Ok(reception)
    }

    #[instrument(skip(self))]
    async fn get_all_for_pvz(&self, pvz_id: Uuid) -> Result<Vec<Reception>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_receptions_for_pvz"])
            .start_timer();

        let receptions = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, date_time, pvz_id, status
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY date_time DESC, seq DESC
            "#,
        )
        .bind(pvz_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_error("list receptions", e))?;

        timer.observe_duration();

        Ok(receptions)
    }

    #[instrument(skip(self))]
    async fn is_open(&self, reception_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["reception_is_open"])
            .start_timer();

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM receptions WHERE id = $1")
                .bind(reception_id)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| db_error("check reception status", e))?;

        timer.observe_duration();

        Ok(status.as_deref() == Some(ReceptionStatus::InProgress.as_str()))
    }

    #[instrument(skip(self))]
    async fn close_most_recent(&self, pvz_id: Uuid) -> Result<Reception, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["close_most_recent_reception"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let latest = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, date_time, pvz_id, status
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY date_time DESC, seq DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(pvz_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("lock most recent reception", e))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("no receptions for pickup point {}", pvz_id))
        })?;

        if !latest.is_open() {
            return Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_ALREADY_CLOSED)));
        }

        let closed = sqlx::query_as::<_, Reception>(
            r#"
            UPDATE receptions
            SET status = $2
            WHERE id = $1
            RETURNING id, date_time, pvz_id, status
            "#,
        )
        .bind(latest.id)
        .bind(ReceptionStatus::Closed.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("close reception", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit reception close", e))?;

        timer.observe_duration();

        debug!(reception_id = %closed.id, "Reception closed");
        Ok(closed)
    }
}

/// Lock the reception row and require it to be open.
async fn lock_open_reception(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    reception_id: Uuid,
) -> Result<(), AppError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM receptions WHERE id = $1 FOR UPDATE")
            .bind(reception_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("lock reception", e))?;

    match status.as_deref() {
        None => Err(AppError::NotFound(anyhow::anyhow!(
            "reception {} not found",
            reception_id
        ))),
        Some(status) if status == ReceptionStatus::InProgress.as_str() => Ok(()),
        Some(_) => Err(AppError::Conflict(anyhow::anyhow!(RECEPTION_CLOSED))),
    }
}

#[async_trait]
impl ProductStore for Database {
    #[instrument(skip(self, product), fields(product_id = %product.id, reception_id = %product.reception_id))]
    async fn append_product(&self, product: &Product) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["append_product"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        lock_open_reception(&mut tx, product.reception_id).await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, date_time, type, reception_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(product.id)
        .bind(product.date_time)
        .bind(product.product_type.as_str())
        .bind(product.reception_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("insert product", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit product insert", e))?;

        timer.observe_duration();

        debug!(product_type = %product.product_type, "Product added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_most_recent_product(&self, reception_id: Uuid) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["remove_most_recent_product"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        lock_open_reception(&mut tx, reception_id).await?;

        let removed = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = (
                SELECT id FROM products
                WHERE reception_id = $1
                ORDER BY date_time DESC, seq DESC
                LIMIT 1
            )
            RETURNING id, date_time, type, reception_id
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("delete product", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("no products to remove")))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit product delete", e))?;

        timer.observe_duration();

        debug!(product_id = %removed.id, "Product removed");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn list_products(&self, reception_id: Uuid) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, date_time, type, reception_id
            FROM products
            WHERE reception_id = $1
            ORDER BY date_time ASC, seq ASC
            "#,
        )
        .bind(reception_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_error("list products", e))?;

        timer.observe_duration();

        Ok(products)
    }
}

#[async_trait]
impl UserStore for Database {
    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("user with this email already exists"))
            }
            _ => db_error("create user", e),
        })?;

        timer.observe_duration();

        debug!("User created");
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, role, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| db_error("find user", e))?;

        timer.observe_duration();

        Ok(user)
    }

    #[instrument(skip(self, email))]
    async fn user_exists(&self, email: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["user_exists"])
            .start_timer();

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.pool())
            .await
            .map_err(|e| db_error("check user existence", e))?;

        timer.observe_duration();

        Ok(exists)
    }
}

#[async_trait]
impl StoreHealth for Database {
    async fn ping(&self) -> Result<(), AppError> {
        self.health_check().await
    }
}
