use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Blog, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
///
/// `insert` and `update` are separate so the caller's intent is explicit:
/// an insert of an existing id is a constraint violation, an update of a
/// missing id is `NotFound`.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Persist changes to an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (lowercased) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Batch lookup used to resolve blog and comment authors.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

/// Blog repository.
#[async_trait]
pub trait BlogRepository: BaseRepository<Blog, Uuid> {
    /// Find a blog by its unique slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepoError>;

    /// All blogs, newest first.
    async fn list_all(&self) -> Result<Vec<Blog>, RepoError>;

    /// One author's blogs, newest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>, RepoError>;
}
