//! # Quill API Server
//!
//! Library surface of the server binary, exposed so integration tests
//! can build the app the same way `main` does.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod state;
