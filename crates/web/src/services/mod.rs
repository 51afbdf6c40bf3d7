//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password authentication (the identity store)
//! - `products` - Product CRUD scoped to the owning user
//!
//! Services borrow the pool from `AppState` and are constructed per request.

pub mod auth;
pub mod products;
