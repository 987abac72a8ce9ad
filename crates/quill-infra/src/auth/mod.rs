//! Authentication implementations - JWT tokens and bcrypt password hashing.

mod jwt;
mod password;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::BcryptPasswordService;
