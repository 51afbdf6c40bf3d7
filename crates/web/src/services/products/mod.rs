//! Product service.
//!
//! CRUD over products, scoped to the owning user. Every operation that
//! touches an existing product goes through [`authorize`], so edit and
//! delete share one ownership rule.
//!
//! There is no optimistic concurrency control: two sessions editing the
//! same product race, and the last write wins.

mod error;

pub use error::ProductError;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use cellarbook_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::Product;
use crate::models::product::ProductForm;

/// Check that `user_id` owns `product`.
///
/// # Errors
///
/// Returns `ProductError::Forbidden` on an ownership mismatch.
pub fn authorize(product: &Product, user_id: UserId) -> Result<(), ProductError> {
    if product.owner_id == user_id {
        Ok(())
    } else {
        Err(ProductError::Forbidden)
    }
}

/// Product service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// List every product owned by `user_id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the database operation fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.list_for_user(user_id).await?)
    }

    /// Validate the form and create a product owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` if any field is missing or malformed.
    #[instrument(skip(self, form))]
    pub async fn create(&self, user_id: UserId, form: &ProductForm) -> Result<Product, ProductError> {
        let input = form.validate()?;
        let product = self.products.create(user_id, &input, Utc::now()).await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Fetch a product for its edit form.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product doesn't exist.
    /// Returns `ProductError::Forbidden` if it belongs to another user.
    pub async fn get_for_edit(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Product, ProductError> {
        self.owned(product_id, user_id).await
    }

    /// Overwrite every field of an owned product.
    ///
    /// Ownership is checked before the form is validated.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product doesn't exist.
    /// Returns `ProductError::Forbidden` if it belongs to another user.
    /// Returns `ProductError::Validation` if any field is missing or malformed.
    #[instrument(skip(self, form))]
    pub async fn update(
        &self,
        product_id: ProductId,
        user_id: UserId,
        form: &ProductForm,
    ) -> Result<Product, ProductError> {
        self.owned(product_id, user_id).await?;
        let input = form.validate()?;

        let product = self
            .products
            .update(product_id, &input, Utc::now())
            .await
            .map_err(not_found)?;

        tracing::info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    /// Permanently delete an owned product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product doesn't exist.
    /// Returns `ProductError::Forbidden` if it belongs to another user.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: ProductId, user_id: UserId) -> Result<(), ProductError> {
        self.owned(product_id, user_id).await?;

        if !self.products.delete(product_id).await? {
            return Err(ProductError::NotFound);
        }

        tracing::info!(%product_id, "product deleted");
        Ok(())
    }

    /// Load a product and apply the ownership guard.
    async fn owned(&self, product_id: ProductId, user_id: UserId) -> Result<Product, ProductError> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(ProductError::NotFound)?;

        if let Err(err) = authorize(&product, user_id) {
            tracing::warn!(%product_id, %user_id, owner_id = %product.owner_id, "ownership check failed");
            return Err(err);
        }

        Ok(product)
    }
}

fn not_found(err: RepositoryError) -> ProductError {
    match err {
        RepositoryError::NotFound => ProductError::NotFound,
        other => ProductError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use cellarbook_core::Price;

    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::services::auth::AuthService;

    fn vodka() -> ProductForm {
        ProductForm {
            name: "Vodka".to_owned(),
            category: "Spirits".to_owned(),
            kind: "Vodka".to_owned(),
            volume: "0.7".to_owned(),
            strength: "40.0".to_owned(),
            quantity: "10".to_owned(),
            price: "599.0".to_owned(),
        }
    }

    async fn users(pool: &SqlitePool) -> (UserId, UserId) {
        let auth = AuthService::new(pool);
        let alice = auth.register("alice", "a@x.com", "pw123").await.unwrap();
        let bob = auth.register("bob", "b@x.com", "pw456").await.unwrap();
        (alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_round_trip_and_edit_timestamps() {
        let pool = memory_pool().await;
        let (alice, _) = users(&pool).await;
        let service = ProductService::new(&pool);

        let created = service.create(alice, &vodka()).await.unwrap();
        let fetched = service.get_for_edit(created.id, alice).await.unwrap();

        assert_eq!(fetched.name, "Vodka");
        assert_eq!(fetched.category, "Spirits");
        assert_eq!(fetched.kind, "Vodka");
        assert!((fetched.volume - 0.7).abs() < f64::EPSILON);
        assert!((fetched.strength - 40.0).abs() < f64::EPSILON);
        assert_eq!(fetched.quantity, 10);
        assert_eq!(fetched.price, Price::parse("599").unwrap());
        assert_eq!(fetched.owner_id, alice);
        assert_eq!(fetched.updated_at, fetched.created_at);

        tokio::time::sleep(Duration::from_millis(5)).await;

        let edited = service
            .update(
                created.id,
                alice,
                &ProductForm {
                    quantity: "5".to_owned(),
                    ..vodka()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.quantity, 5);
        assert_eq!(edited.created_at, created.created_at);
        assert!(edited.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_listing_is_per_owner() {
        let pool = memory_pool().await;
        let (alice, bob) = users(&pool).await;
        let service = ProductService::new(&pool);

        let product = service.create(alice, &vodka()).await.unwrap();

        let alices: Vec<ProductId> = service
            .list_for_user(alice)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(alices, [product.id]);
        assert!(service.list_for_user(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let pool = memory_pool().await;
        let (alice, bob) = users(&pool).await;
        let service = ProductService::new(&pool);
        let product = service.create(alice, &vodka()).await.unwrap();

        let edit = ProductForm {
            quantity: "0".to_owned(),
            ..vodka()
        };
        assert!(matches!(
            service.update(product.id, bob, &edit).await,
            Err(ProductError::Forbidden)
        ));
        assert!(matches!(
            service.delete(product.id, bob).await,
            Err(ProductError::Forbidden)
        ));
        assert!(matches!(
            service.get_for_edit(product.id, bob).await,
            Err(ProductError::Forbidden)
        ));

        let unchanged = service.get_for_edit(product.id, alice).await.unwrap();
        assert_eq!(unchanged, product);
    }

    #[tokio::test]
    async fn test_forbidden_takes_precedence_over_validation() {
        let pool = memory_pool().await;
        let (alice, bob) = users(&pool).await;
        let service = ProductService::new(&pool);
        let product = service.create(alice, &vodka()).await.unwrap();

        let garbage = ProductForm::default();
        assert!(matches!(
            service.update(product.id, bob, &garbage).await,
            Err(ProductError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let pool = memory_pool().await;
        let (alice, _) = users(&pool).await;
        let service = ProductService::new(&pool);
        let missing = ProductId::new(12345);

        assert!(matches!(
            service.update(missing, alice, &vodka()).await,
            Err(ProductError::NotFound)
        ));
        assert!(matches!(
            service.delete(missing, alice).await,
            Err(ProductError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_product() {
        let pool = memory_pool().await;
        let (alice, _) = users(&pool).await;
        let service = ProductService::new(&pool);
        let product = service.create(alice, &vodka()).await.unwrap();

        service.delete(product.id, alice).await.unwrap();
        assert!(matches!(
            service.get_for_edit(product.id, alice).await,
            Err(ProductError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalid_form_creates_nothing() {
        let pool = memory_pool().await;
        let (alice, _) = users(&pool).await;
        let service = ProductService::new(&pool);

        let form = ProductForm {
            volume: "a lot".to_owned(),
            ..vodka()
        };
        let err = service.create(alice, &form).await.unwrap_err();
        assert_eq!(err.to_string(), "Volume must be a number");
        assert!(service.list_for_user(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_product_unchanged() {
        let pool = memory_pool().await;
        let (alice, _) = users(&pool).await;
        let service = ProductService::new(&pool);
        let product = service.create(alice, &vodka()).await.unwrap();

        let form = ProductForm {
            price: "-1".to_owned(),
            ..vodka()
        };
        assert!(matches!(
            service.update(product.id, alice, &form).await,
            Err(ProductError::Validation(_))
        ));
        assert_eq!(service.get_for_edit(product.id, alice).await.unwrap(), product);
    }

    #[test]
    fn test_authorize() {
        let product = Product {
            id: ProductId::new(1),
            name: "Stout".to_owned(),
            category: "Beer".to_owned(),
            kind: "Stout".to_owned(),
            volume: 0.33,
            strength: 4.2,
            quantity: 24,
            price: Price::parse("2.5").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_id: UserId::new(1),
        };

        assert!(authorize(&product, UserId::new(1)).is_ok());
        assert!(matches!(
            authorize(&product, UserId::new(2)),
            Err(ProductError::Forbidden)
        ));
    }
}
