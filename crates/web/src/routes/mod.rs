//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Landing page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! GET  /logout                 - Logout action (requires auth)
//!
//! # Products (requires auth)
//! GET  /products               - The current user's products
//! GET  /products/add           - Add form
//! POST /products/add           - Create product
//! GET  /products/edit/{id}     - Edit form
//! POST /products/edit/{id}     - Update product
//! POST /products/delete/{id}   - Delete product
//! ```
//!
//! Every mutating action answers with a 303 redirect and queues a flash
//! message for the page it redirects to.

pub mod auth;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{
    Flash, FlashLevel, create_session_layer, flash, request_id_middleware,
    security_headers_middleware,
};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Data every rendered page needs for the layout.
pub struct Page {
    /// The logged-in user, for the navigation bar.
    pub user: Option<CurrentUser>,
    /// Flash messages queued by the previous request.
    pub flashes: Vec<Flash>,
}

impl Page {
    /// Build the layout context, consuming pending flash messages.
    pub async fn load(session: &Session, user: Option<CurrentUser>) -> Self {
        Self {
            user,
            flashes: flash::take(session).await,
        }
    }
}

/// Queue a flash message and redirect with 303 See Other.
///
/// # Errors
///
/// Returns `AppError::Session` if the flash cannot be stored.
pub async fn flash_redirect(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Result<Response> {
    flash::push(session, level, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout).post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/add", get(products::add_page).post(products::add))
        .route("/edit/{id}", get(products::edit_page).post(products::edit))
        .route("/delete/{id}", post(products::delete))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(auth_routes())
        .nest("/products", product_routes())
}

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
