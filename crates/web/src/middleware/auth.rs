//! Authentication extractors and session helpers.
//!
//! A session is authenticated when it holds a [`CurrentUser`] under
//! `session_keys::CURRENT_USER` whose user still exists. [`login`] writes
//! that key; [`logout`] and [`current_user`] are the only places that
//! clear it.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use super::flash::{self, FlashLevel};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, queues an info flash and redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is logged in.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// No session layer is installed on this route.
    MissingSession,
    /// The session or user store failed.
    Failed(AppError),
}

impl From<AppError> for AuthRejection {
    fn from(err: AppError) -> Self {
        Self::Failed(err)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;
        let state = AppState::from_ref(state);

        if let Some(user) = current_user(session, state.pool()).await? {
            return Ok(Self(user));
        }

        tracing::debug!(path = %parts.uri.path(), "unauthenticated request redirected to login");
        if let Err(e) = flash::push(
            session,
            FlashLevel::Info,
            "Please log in to access this page.",
        )
        .await
        {
            tracing::warn!(error = %e, "failed to queue login flash");
        }

        Err(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };
        let state = AppState::from_ref(state);

        Ok(Self(current_user(session, state.pool()).await?))
    }
}

/// The user bound to this session, if any, as currently stored.
///
/// A session whose user has been removed from the store is unbound and
/// treated as logged out.
///
/// # Errors
///
/// Returns an error if the user store or the session cannot be accessed.
pub async fn current_user(
    session: &Session,
    pool: &SqlitePool,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(bound) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    match AuthService::new(pool).get_user(bound.id).await {
        Ok(user) => Ok(Some(CurrentUser::from(&user))),
        Err(AuthError::AuthenticationFailed) => {
            tracing::warn!(user_id = %bound.id, "session bound to a missing user, logging out");
            session
                .remove::<CurrentUser>(session_keys::CURRENT_USER)
                .await?;
            clear_sentry_user();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Bind the session to `user`.
///
/// The session ID is cycled first so an ID issued before login cannot be
/// reused afterwards.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn login(
    session: &Session,
    user: &User,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    let current = CurrentUser::from(user);

    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, &current).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(current)
}

/// Unbind the session from its user and issue a fresh session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn logout(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await?;

    clear_sentry_user();
    Ok(())
}
