//! One-shot flash messages carried across a redirect.
//!
//! Handlers `push` a message before redirecting; the next rendered page
//! `take`s every pending message, which removes them from the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message, used as the CSS modifier in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
    Info,
}

impl FlashLevel {
    /// CSS class suffix for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Info => "info",
        }
    }
}

/// A pending flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Queue a flash message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn push(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session.get(session_keys::FLASH).await?.unwrap_or_default();
    pending.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(session_keys::FLASH, pending).await
}

/// Remove and return every pending flash message.
///
/// A session that cannot be read yields no messages.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read flash messages");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_messages_are_taken_once_in_order() {
        let session = session();
        push(&session, FlashLevel::Success, "first").await.unwrap();
        push(&session, FlashLevel::Danger, "second").await.unwrap();

        let messages = take(&session).await;
        assert_eq!(
            messages,
            [
                Flash {
                    level: FlashLevel::Success,
                    message: "first".to_owned()
                },
                Flash {
                    level: FlashLevel::Danger,
                    message: "second".to_owned()
                },
            ]
        );
        assert!(take(&session).await.is_empty());
    }

    #[test]
    fn test_level_names() {
        assert_eq!(FlashLevel::Success.as_str(), "success");
        assert_eq!(FlashLevel::Danger.as_str(), "danger");
        assert_eq!(FlashLevel::Info.as_str(), "info");
    }
}
