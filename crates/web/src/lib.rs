//! Cellarbook web application library.
//!
//! The router, services and storage live here so the binary and the
//! integration tests build the same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use routes::app;
pub use state::AppState;
