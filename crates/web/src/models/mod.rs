//! Domain models for Cellarbook.
//!
//! These types represent validated domain objects separate from database
//! row types (see `crate::db`).

pub mod product;
pub mod session;
pub mod user;

pub use product::{Product, ProductInput};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
