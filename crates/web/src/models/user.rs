//! User domain types.

use chrono::{DateTime, Utc};

use cellarbook_core::{Email, UserId, Username};

/// A registered account.
///
/// The password hash is deliberately absent: it is only ever read by the
/// repository method that verifies a login.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Unique email address.
    pub email: Email,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
