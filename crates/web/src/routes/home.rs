//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;

use super::Page;
use crate::filters;
use crate::middleware::OptionalAuth;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: Page,
}

/// Display the landing page.
///
/// Guests see login and register links; logged-in users see a link to
/// their inventory.
pub async fn home(OptionalAuth(user): OptionalAuth, session: Session) -> impl IntoResponse {
    IndexTemplate {
        page: Page::load(&session, user).await,
    }
}
