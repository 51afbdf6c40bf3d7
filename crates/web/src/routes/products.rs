//! Product inventory route handlers.
//!
//! Every handler requires a logged-in user and only ever touches that
//! user's products.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use cellarbook_core::ProductId;

use super::{Page, flash_redirect};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{FlashLevel, RequireAuth};
use crate::models::Product;
use crate::models::product::ProductForm;
use crate::services::products::{ProductError, ProductService};
use crate::state::AppState;

const PRODUCTS_PATH: &str = "/products";

// =============================================================================
// View Types
// =============================================================================

/// Product prepared for display in the inventory table.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub kind: String,
    pub volume: String,
    pub strength: String,
    pub quantity: i64,
    pub price: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category.clone(),
            kind: product.kind.clone(),
            volume: format!("{} l", product.volume),
            strength: format!("{:.1}%", product.strength),
            quantity: product.quantity,
            price: product.price.to_string(),
            created_at: product.created_at.format("%Y-%m-%d %H:%M").to_string(),
            updated_at: product.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Inventory listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub page: Page,
    pub products: Vec<ProductView>,
}

/// Add/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: Page,
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: ProductForm,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the current user's products.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response> {
    let products = ProductService::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(ProductListTemplate {
        products: products.iter().map(ProductView::from).collect(),
        page: Page::load(&session, Some(user)).await,
    }
    .into_response())
}

/// Display an empty add form.
pub async fn add_page(RequireAuth(user): RequireAuth, session: Session) -> impl IntoResponse {
    ProductFormTemplate {
        page: Page::load(&session, Some(user)).await,
        title: "Add Product",
        action: format!("{PRODUCTS_PATH}/add"),
        submit_label: "Add Product",
        form: ProductForm::default(),
    }
}

/// Create a product owned by the current user.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    match ProductService::new(state.pool()).create(user.id, &form).await {
        Ok(product) => {
            let id = product.id.to_string();
            add_breadcrumb("product", "Product added", Some(&[("product_id", id.as_str())]));
            flash_redirect(
                &session,
                FlashLevel::Success,
                "Product added successfully!",
                PRODUCTS_PATH,
            )
            .await
        }
        Err(ProductError::Validation(e)) => {
            flash_redirect(
                &session,
                FlashLevel::Danger,
                e.to_string(),
                &format!("{PRODUCTS_PATH}/add"),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form pre-filled with the product's current values.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response> {
    let product_id = ProductId::new(id);

    match ProductService::new(state.pool())
        .get_for_edit(product_id, user.id)
        .await
    {
        Ok(product) => Ok(ProductFormTemplate {
            page: Page::load(&session, Some(user)).await,
            title: "Edit Product",
            action: format!("{PRODUCTS_PATH}/edit/{product_id}"),
            submit_label: "Save Changes",
            form: ProductForm::from(&product),
        }
        .into_response()),
        Err(e) => reject(&session, e, Action::Edit).await,
    }
}

/// Overwrite a product the current user owns.
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);

    match ProductService::new(state.pool())
        .update(product_id, user.id, &form)
        .await
    {
        Ok(_) => {
            flash_redirect(
                &session,
                FlashLevel::Success,
                "Product updated successfully!",
                PRODUCTS_PATH,
            )
            .await
        }
        Err(ProductError::Validation(e)) => {
            flash_redirect(
                &session,
                FlashLevel::Danger,
                e.to_string(),
                &format!("{PRODUCTS_PATH}/edit/{product_id}"),
            )
            .await
        }
        Err(e) => reject(&session, e, Action::Edit).await,
    }
}

/// Delete a product the current user owns.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response> {
    let product_id = ProductId::new(id);

    match ProductService::new(state.pool())
        .delete(product_id, user.id)
        .await
    {
        Ok(()) => {
            let id = product_id.to_string();
            add_breadcrumb("product", "Product deleted", Some(&[("product_id", id.as_str())]));
            flash_redirect(
                &session,
                FlashLevel::Success,
                "Product deleted successfully!",
                PRODUCTS_PATH,
            )
            .await
        }
        Err(e) => reject(&session, e, Action::Delete).await,
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Action {
    Edit,
    Delete,
}

/// Turn a lookup or ownership failure into a redirect back to the listing.
///
/// Anything else propagates as an `AppError`.
async fn reject(session: &Session, err: ProductError, action: Action) -> Result<Response> {
    let message = match (err, action) {
        (ProductError::NotFound, _) => "Product not found",
        (ProductError::Forbidden, Action::Edit) => "You do not have permission to edit this product",
        (ProductError::Forbidden, Action::Delete) => {
            "You do not have permission to delete this product"
        }
        (err, _) => return Err(err.into()),
    };

    flash_redirect(session, FlashLevel::Danger, message, PRODUCTS_PATH).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use cellarbook_core::{Price, UserId};

    use super::*;

    #[test]
    fn test_product_view_formatting() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let product = Product {
            id: ProductId::new(3),
            name: "Vodka".to_owned(),
            category: "Spirits".to_owned(),
            kind: "Vodka".to_owned(),
            volume: 0.7,
            strength: 40.0,
            quantity: 10,
            price: Price::parse("599").unwrap(),
            created_at: at,
            updated_at: at,
            owner_id: UserId::new(1),
        };

        let view = ProductView::from(&product);
        assert_eq!(view.id, 3);
        assert_eq!(view.volume, "0.7 l");
        assert_eq!(view.strength, "40.0%");
        assert_eq!(view.price, "599.00");
        assert_eq!(view.created_at, "2026-03-14 09:26");
    }
}
