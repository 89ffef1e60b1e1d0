//! Used phone listing repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use sib_store_core::{PhoneNumber, Price, UsedPhoneId};

use super::RepositoryError;
use crate::models::used_phone::{UsedPhone, UsedPhoneInput};

const COLUMNS: &str = "id, model_name, storage, color, condition, battery_health, price, \
                       description, images, seller_name, seller_phone, is_approved, is_sold, \
                       created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UsedPhoneRow {
    id: i64,
    model_name: String,
    storage: String,
    color: String,
    condition: String,
    battery_health: Option<i64>,
    price: i64,
    description: String,
    images: String,
    seller_name: String,
    seller_phone: String,
    is_approved: bool,
    is_sold: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UsedPhoneRow> for UsedPhone {
    type Error = RepositoryError;

    fn try_from(row: UsedPhoneRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} in used phone {}: {e}", row.id))
        };

        let price = Price::new(row.price).map_err(|e| corrupt("price", &e))?;
        let images: Vec<String> =
            serde_json::from_str(&row.images).map_err(|e| corrupt("images", &e))?;
        let seller_phone =
            PhoneNumber::parse(&row.seller_phone).map_err(|e| corrupt("seller phone", &e))?;

        Ok(Self {
            id: UsedPhoneId::new(row.id),
            model_name: row.model_name,
            storage: row.storage,
            color: row.color,
            condition: row.condition,
            battery_health: row.battery_health,
            price,
            description: row.description,
            images,
            seller_name: row.seller_name,
            seller_phone,
            is_approved: row.is_approved,
            is_sold: row.is_sold,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for used phone listings.
pub struct UsedPhoneRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UsedPhoneRepository<'a> {
    /// Create a new used phone repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List listings, newest first.
    ///
    /// Without `include_all`, only approved and unsold listings are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, include_all: bool) -> Result<Vec<UsedPhone>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS}
             FROM used_phones
             WHERE ? OR (is_approved = 1 AND is_sold = 0)
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, UsedPhoneRow>(&sql)
            .bind(include_all)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(UsedPhone::try_from).collect()
    }

    /// Get a listing by ID regardless of approval.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UsedPhoneId) -> Result<Option<UsedPhone>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM used_phones WHERE id = ?");
        let row = sqlx::query_as::<_, UsedPhoneRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(UsedPhone::try_from).transpose()
    }

    /// Store a validated listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &UsedPhoneInput,
        approved: bool,
    ) -> Result<UsedPhone, RepositoryError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO used_phones
                 (model_name, storage, color, condition, battery_health, price, description,
                  images, seller_name, seller_phone, is_approved, is_sold, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UsedPhoneRow>(&sql)
            .bind(&input.model_name)
            .bind(&input.storage)
            .bind(&input.color)
            .bind(&input.condition)
            .bind(input.battery_health)
            .bind(input.price)
            .bind(&input.description)
            .bind(encode_images(&input.images)?)
            .bind(&input.seller_name)
            .bind(&input.seller_phone)
            .bind(approved)
            .bind(input.is_sold)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "used phone"))?;

        row.try_into()
    }

    /// Replace all fields of a listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    pub async fn update(
        &self,
        id: UsedPhoneId,
        input: &UsedPhoneInput,
    ) -> Result<UsedPhone, RepositoryError> {
        let sql = format!(
            "UPDATE used_phones
             SET model_name = ?, storage = ?, color = ?, condition = ?, battery_health = ?,
                 price = ?, description = ?, images = ?, seller_name = ?, seller_phone = ?,
                 is_approved = ?, is_sold = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UsedPhoneRow>(&sql)
            .bind(&input.model_name)
            .bind(&input.storage)
            .bind(&input.color)
            .bind(&input.condition)
            .bind(input.battery_health)
            .bind(input.price)
            .bind(&input.description)
            .bind(encode_images(&input.images)?)
            .bind(&input.seller_name)
            .bind(&input.seller_phone)
            .bind(input.is_approved.unwrap_or(false))
            .bind(input.is_sold)
            .bind(Utc::now())
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "used phone"))?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    pub async fn delete(&self, id: UsedPhoneId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM used_phones WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn encode_images(images: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(images)
        .map_err(|e| RepositoryError::DataCorruption(format!("cannot encode images: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn listing(model: &str) -> UsedPhoneInput {
        UsedPhoneInput {
            model_name: model.to_string(),
            storage: "128GB".to_string(),
            color: "Blue".to_string(),
            condition: "خیلی خوب".to_string(),
            battery_health: Some(91),
            price: 28_500_000,
            description: "بدون خط و خش".to_string(),
            images: vec!["https://res.cloudinary.com/demo/image/upload/1.jpg".to_string()],
            seller_name: "Mina".to_string(),
            seller_phone: "09351234567".to_string(),
            is_approved: None,
            is_sold: false,
        }
    }

    #[tokio::test]
    async fn test_public_list_only_shows_approved_unsold() {
        let pool = test_support::pool().await;
        let repo = UsedPhoneRepository::new(&pool);

        let pending = repo.create(&listing("iPhone 12"), false).await.unwrap();
        let approved = repo.create(&listing("iPhone 13"), true).await.unwrap();
        let mut sold = listing("iPhone 14");
        sold.is_sold = true;
        repo.create(&sold, true).await.unwrap();

        let public = repo.list(false).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, approved.id);
        assert_eq!(public[0].images.len(), 1);

        let all = repo.list(true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|p| p.id == pending.id && !p.is_approved));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = test_support::pool().await;
        let repo = UsedPhoneRepository::new(&pool);

        let created = repo.create(&listing("iPhone 13"), false).await.unwrap();
        let mut changed = listing("iPhone 13 mini");
        changed.is_approved = Some(true);
        let updated = repo.update(created.id, &changed).await.unwrap();
        assert_eq!(updated.model_name, "iPhone 13 mini");
        assert!(updated.is_approved);

        repo.delete(created.id).await.unwrap();
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(matches!(
            repo.update(created.id, &changed).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
