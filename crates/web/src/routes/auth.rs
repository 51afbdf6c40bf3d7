//! Authentication route handlers.
//!
//! Registration, login and logout against the local user table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::{Page, flash_redirect};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{self, FlashLevel, OptionalAuth, RequireAuth};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Where logged-in users land.
const HOME_FOR_USERS: &str = "/products";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_FOR_USERS).into_response();
    }

    LoginTemplate {
        page: Page::load(&session, None).await,
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to(HOME_FOR_USERS).into_response());
    }

    let auth = AuthService::new(state.pool());
    match auth.authenticate(&form.username, &form.password).await {
        Ok(user) => {
            middleware::login(&session, &user).await?;
            tracing::info!(user_id = %user.id, "user logged in");
            add_breadcrumb("auth", "Logged in", None);

            flash_redirect(
                &session,
                FlashLevel::Success,
                "You have logged in successfully!",
                HOME_FOR_USERS,
            )
            .await
        }
        Err(AuthError::AuthenticationFailed) => {
            tracing::warn!(username = %form.username, "login failed");
            flash_redirect(
                &session,
                FlashLevel::Danger,
                "Invalid username or password",
                "/login",
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_FOR_USERS).into_response();
    }

    RegisterTemplate {
        page: Page::load(&session, None).await,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Registration does not log the user in; they are sent to the login page.
pub async fn register(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to(HOME_FOR_USERS).into_response());
    }

    let auth = AuthService::new(state.pool());
    let message = match auth
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(_) => {
            return flash_redirect(
                &session,
                FlashLevel::Success,
                "Registration successful! You can now log in.",
                "/login",
            )
            .await;
        }
        Err(AuthError::DuplicateUsername) => "A user with this username already exists".to_owned(),
        Err(AuthError::DuplicateEmail) => "A user with this email already exists".to_owned(),
        Err(AuthError::Validation(message)) => message,
        Err(e) => return Err(e.into()),
    };

    tracing::info!(username = %form.username, reason = %message, "registration rejected");
    flash_redirect(&session, FlashLevel::Danger, message, "/register").await
}

// =============================================================================
// Logout
// =============================================================================

/// End the session and return to the landing page.
pub async fn logout(RequireAuth(user): RequireAuth, session: Session) -> Result<Response> {
    middleware::logout(&session).await?;
    tracing::info!(user_id = %user.id, "user logged out");

    flash_redirect(&session, FlashLevel::Info, "You have been logged out", "/").await
}
