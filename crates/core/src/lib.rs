//! Cellarbook Core - Shared domain types.
//!
//! This crate provides the types shared by the web application and its tests:
//! validated user identity fields, type-safe IDs, and the product price.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Validation lives here so every layer agrees on what a
//! well-formed username, email or price looks like.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, usernames, emails, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
