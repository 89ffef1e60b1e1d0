//! WhatsApp purchase orders and Apple ID requests.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use sib_store_core::{
    AppleIdOrderId, ColorId, Email, ModelId, OrderStatus, PhoneNumber, Price, StorageId,
    WhatsappOrderId,
};

use super::RepositoryError;
use crate::models::order::{AppleIdOrder, NewAppleIdOrder, NewWhatsappOrder, WhatsappOrder};

const WHATSAPP_COLUMNS: &str = "id, customer_name, phone, model_id, color_id, storage_id, \
                                model_name, color_name, storage_name, price, note, status, \
                                created_at";

const APPLE_ID_COLUMNS: &str = "id, customer_name, phone, email, note, status, created_at";

// =============================================================================
// WhatsApp orders
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct WhatsappOrderRow {
    id: i64,
    customer_name: String,
    phone: String,
    model_id: Option<i64>,
    color_id: Option<i64>,
    storage_id: Option<i64>,
    model_name: Option<String>,
    color_name: Option<String>,
    storage_name: Option<String>,
    price: Option<i64>,
    note: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<WhatsappOrderRow> for WhatsappOrder {
    type Error = RepositoryError;

    fn try_from(row: WhatsappOrderRow) -> Result<Self, Self::Error> {
        let phone = PhoneNumber::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in order {}: {e}", row.id))
        })?;
        let price = row
            .price
            .map(Price::new)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in order {}: {e}", row.id))
            })?;

        Ok(Self {
            id: WhatsappOrderId::new(row.id),
            customer_name: row.customer_name,
            phone,
            model_id: row.model_id.map(ModelId::new),
            color_id: row.color_id.map(ColorId::new),
            storage_id: row.storage_id.map(StorageId::new),
            model_name: row.model_name,
            color_name: row.color_name,
            storage_name: row.storage_name,
            price,
            note: row.note,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// Repository for WhatsApp purchase orders.
pub struct WhatsappOrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> WhatsappOrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new order with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if a catalog ID does not exist.
    pub async fn create(&self, order: &NewWhatsappOrder) -> Result<WhatsappOrder, RepositoryError> {
        let sql = format!(
            "INSERT INTO whatsapp_orders
                 (customer_name, phone, model_id, color_id, storage_id, model_name,
                  color_name, storage_name, price, note, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {WHATSAPP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WhatsappOrderRow>(&sql)
            .bind(&order.customer_name)
            .bind(order.phone.as_str())
            .bind(order.model_id.map(ModelId::as_i64))
            .bind(order.color_id.map(ColorId::as_i64))
            .bind(order.storage_id.map(StorageId::as_i64))
            .bind(&order.model_name)
            .bind(&order.color_name)
            .bind(&order.storage_name)
            .bind(order.price.map(Price::toman))
            .bind(&order.note)
            .bind(OrderStatus::New)
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "order"))?;

        row.try_into()
    }

    /// List orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<WhatsappOrder>, RepositoryError> {
        let sql = format!(
            "SELECT {WHATSAPP_COLUMNS}
             FROM whatsapp_orders
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, WhatsappOrderRow>(&sql)
            .bind(status)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(WhatsappOrder::try_from).collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: WhatsappOrderId) -> Result<Option<WhatsappOrder>, RepositoryError> {
        let sql = format!("SELECT {WHATSAPP_COLUMNS} FROM whatsapp_orders WHERE id = ?");
        let row = sqlx::query_as::<_, WhatsappOrderRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(WhatsappOrder::try_from).transpose()
    }

    /// Set the follow-up status and admin note.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: WhatsappOrderId,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<WhatsappOrder, RepositoryError> {
        let sql = format!(
            "UPDATE whatsapp_orders SET status = ?, note = ? WHERE id = ?
             RETURNING {WHATSAPP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WhatsappOrderRow>(&sql)
            .bind(status)
            .bind(note)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: WhatsappOrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM whatsapp_orders WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Apple ID orders
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AppleIdOrderRow {
    id: i64,
    customer_name: String,
    phone: String,
    email: Option<String>,
    note: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<AppleIdOrderRow> for AppleIdOrder {
    type Error = RepositoryError;

    fn try_from(row: AppleIdOrderRow) -> Result<Self, Self::Error> {
        let phone = PhoneNumber::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in Apple ID order {}: {e}", row.id))
        })?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid email in Apple ID order {}: {e}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: AppleIdOrderId::new(row.id),
            customer_name: row.customer_name,
            phone,
            email,
            note: row.note,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// Repository for Apple ID requests.
pub struct AppleIdOrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AppleIdOrderRepository<'a> {
    /// Create a new Apple ID order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new request with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewAppleIdOrder) -> Result<AppleIdOrder, RepositoryError> {
        let sql = format!(
            "INSERT INTO apple_id_orders (customer_name, phone, email, note, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {APPLE_ID_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AppleIdOrderRow>(&sql)
            .bind(&order.customer_name)
            .bind(order.phone.as_str())
            .bind(order.email.as_ref().map(Email::as_str))
            .bind(&order.note)
            .bind(OrderStatus::New)
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Apple ID order"))?;

        row.try_into()
    }

    /// List requests newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<AppleIdOrder>, RepositoryError> {
        let sql = format!(
            "SELECT {APPLE_ID_COLUMNS}
             FROM apple_id_orders
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AppleIdOrderRow>(&sql)
            .bind(status)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(AppleIdOrder::try_from).collect()
    }

    /// Get a request by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AppleIdOrderId) -> Result<Option<AppleIdOrder>, RepositoryError> {
        let sql = format!("SELECT {APPLE_ID_COLUMNS} FROM apple_id_orders WHERE id = ?");
        let row = sqlx::query_as::<_, AppleIdOrderRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(AppleIdOrder::try_from).transpose()
    }

    /// Set the follow-up status and admin note.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    pub async fn update_status(
        &self,
        id: AppleIdOrderId,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<AppleIdOrder, RepositoryError> {
        let sql = format!(
            "UPDATE apple_id_orders SET status = ?, note = ? WHERE id = ?
             RETURNING {APPLE_ID_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AppleIdOrderRow>(&sql)
            .bind(status)
            .bind(note)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    pub async fn delete(&self, id: AppleIdOrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM apple_id_orders WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
