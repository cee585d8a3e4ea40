//! # Auth Services
//!
//! Account management and request authentication for the campspot marketplace.
//! It includes JWT token handling, middleware for request authentication, and
//! the user and session store.

/// JWT token handling
pub mod jwt;
/// Middleware for request authentication
pub mod middleware;
/// User accounts, sessions and password recovery
pub mod service;
/// Types and structures used in authentication services.
pub mod types;
