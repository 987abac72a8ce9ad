//! # Quill Shared
//!
//! Request/response types for the HTTP API. Wire names are camelCase to
//! match the frontend's expectations.

pub mod dto;
pub mod response;

pub use response::Message;
