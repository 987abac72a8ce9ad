//! Middleware modules.

pub mod auth;
pub mod cache;
pub mod error;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;
