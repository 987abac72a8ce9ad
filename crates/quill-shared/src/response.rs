//! The universal `{ "message": ... }` body.
//!
//! Every error response uses this shape, as do the handful of endpoints
//! that only acknowledge an action (password change, blog deletion).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
