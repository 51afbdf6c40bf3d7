//! Product repository for database operations.
//!
//! The repository stores and fetches rows; ownership checks live in
//! `services::products`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use cellarbook_core::{Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Product, ProductInput};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category: String,
    kind: String,
    volume: f64,
    strength: f64,
    quantity: i64,
    price: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid price {:?} for product {}: {e}",
                row.price, row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            kind: row.kind,
            volume: row.volume,
            strength: row.strength,
            quantity: row.quantity,
            price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner_id: UserId::new(row.user_id),
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, category, kind, volume, strength, quantity, price, \
                               created_at, updated_at, user_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all products owned by a user, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE user_id = ? ORDER BY id ASC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product owned by `user_id`.
    ///
    /// Both timestamps are set to `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including an
    /// unknown owner, rejected by the foreign key).
    pub async fn create(
        &self,
        user_id: UserId,
        input: &ProductInput,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products
                (name, category, kind, volume, strength, quantity, price, created_at, updated_at, user_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.kind)
        .bind(input.volume)
        .bind(input.strength)
        .bind(input.quantity)
        .bind(input.price.to_storage_string())
        .bind(now)
        .bind(now)
        .bind(user_id.as_i64())
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Overwrite every field of a product and set `updated_at` to `now`.
    ///
    /// The owner and `created_at` are never changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = ?, category = ?, kind = ?, volume = ?, strength = ?,
                quantity = ?, price = ?, updated_at = ?
            WHERE id = ?
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.kind)
        .bind(input.volume)
        .bind(input.strength)
        .bind(input.quantity)
        .bind(input.price.to_storage_string())
        .bind(now)
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product by ID.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cellarbook_core::{Email, Username};

    use super::*;
    use crate::db::UserRepository;
    use crate::db::test_support::memory_pool;

    fn gin() -> ProductInput {
        ProductInput {
            name: "London Dry".to_owned(),
            category: "Spirits".to_owned(),
            kind: "Gin".to_owned(),
            volume: 0.5,
            strength: 37.5,
            quantity: 3,
            price: Price::parse("24.90").unwrap(),
        }
    }

    async fn owner(pool: &SqlitePool, name: &str) -> UserId {
        UserRepository::new(pool)
            .create(
                &Username::parse(name).unwrap(),
                &Email::parse(&format!("{name}@x.com")).unwrap(),
                "hash",
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);
        let user_id = owner(&pool, "alice").await;
        let now = Utc::now();

        let created = repo.create(user_id, &gin(), now).await.unwrap();
        assert_eq!(created.owner_id, user_id);
        assert_eq!(created.created_at, now);
        assert_eq!(created.updated_at, now);
        assert_eq!(created.price.to_string(), "24.90");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_ordered() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);
        let alice = owner(&pool, "alice").await;
        let bob = owner(&pool, "bob").await;

        let first = repo.create(alice, &gin(), Utc::now()).await.unwrap();
        repo.create(bob, &gin(), Utc::now()).await.unwrap();
        let second = repo.create(alice, &gin(), Utc::now()).await.unwrap();

        let ids: Vec<ProductId> = repo
            .list_for_user(alice)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, [first.id, second.id]);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let err = repo
            .update(ProductId::new(404), &gin(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);
        let user_id = owner(&pool, "alice").await;
        let product = repo.create(user_id, &gin(), Utc::now()).await.unwrap();

        assert!(repo.delete(product.id).await.unwrap());
        assert!(!repo.delete(product.id).await.unwrap());
        assert!(repo.get(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_owner_is_rejected() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let result = repo.create(UserId::new(999), &gin(), Utc::now()).await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }
}
