//! Database connection management and repository implementations.

mod connections;
mod memory_repo;
mod postgres_base;
pub mod postgres_repo;

pub mod entity;

pub use connections::{DatabaseConfig, DatabaseConnections};
pub use memory_repo::{InMemoryBlogRepository, InMemoryUserRepository};
pub use postgres_repo::{PostgresBlogRepository, PostgresUserRepository};
