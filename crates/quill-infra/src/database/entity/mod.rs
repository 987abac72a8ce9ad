//! SeaORM entities and their conversions to and from domain types.

pub mod blog;
pub mod user;
