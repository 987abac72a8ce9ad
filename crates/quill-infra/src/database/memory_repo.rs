//! In-memory repository implementations.
//!
//! Back the server when no database is configured and drive the
//! integration tests. Unique constraints mirror the ones declared on
//! the SeaORM entities so both backends reject the same writes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Blog, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, BlogRepository, UserRepository};

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn insert(&self, entity: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if store.contains_key(&entity.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        let conflict = store
            .values()
            .any(|u| u.email == entity.email || u.username == entity.username);
        if conflict {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if !store.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        let conflict = store
            .values()
            .any(|u| u.id != entity.id && (u.email == entity.email || u.username == entity.username));
        if conflict {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }
}

/// In-memory blog repository.
#[derive(Default)]
pub struct InMemoryBlogRepository {
    store: RwLock<HashMap<Uuid, Blog>>,
}

impl InMemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut blogs: Vec<Blog>) -> Vec<Blog> {
    blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    blogs
}

#[async_trait]
impl BaseRepository<Blog, Uuid> for InMemoryBlogRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn insert(&self, entity: Blog) -> Result<Blog, RepoError> {
        let mut store = self.store.write().await;

        if store.contains_key(&entity.id) || store.values().any(|b| b.slug == entity.slug) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Blog) -> Result<Blog, RepoError> {
        let mut store = self.store.write().await;

        if !store.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        if store
            .values()
            .any(|b| b.id != entity.id && b.slug == entity.slug)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl BlogRepository for InMemoryBlogRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|b| b.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Blog>, RepoError> {
        let store = self.store.read().await;
        Ok(newest_first(store.values().cloned().collect()))
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>, RepoError> {
        let store = self.store.read().await;
        Ok(newest_first(
            store
                .values()
                .filter(|b| b.author_id == author_id)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        User::new(username.to_string(), email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_user_unique_email_and_username() {
        let repo = InMemoryUserRepository::new();

        repo.insert(user("alice", "alice@example.com")).await.unwrap();

        let dup_email = repo.insert(user("bob", "alice@example.com")).await;
        assert!(matches!(dup_email, Err(RepoError::Constraint(_))));

        let dup_username = repo.insert(user("alice", "other@example.com")).await;
        assert!(matches!(dup_username, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_user_update_requires_existing_row() {
        let repo = InMemoryUserRepository::new();

        let phantom = user("ghost", "ghost@example.com");
        assert!(matches!(repo.update(phantom).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_user_update_keeps_own_unique_values() {
        let repo = InMemoryUserRepository::new();

        let mut alice = repo.insert(user("alice", "alice@example.com")).await.unwrap();
        alice.phone_number = "555-0100".to_string();

        // Updating without changing email or username must not conflict
        // with the user's own row.
        let updated = repo.update(alice).await.unwrap();
        assert_eq!(updated.phone_number, "555-0100");
    }

    #[tokio::test]
    async fn test_blog_unique_slug() {
        let repo = InMemoryBlogRepository::new();
        let author = Uuid::new_v4();

        let first = Blog::new(author, "Title".to_string(), "c".to_string(), vec![]);
        repo.insert(first).await.unwrap();

        let second = Blog::new(author, "Title".to_string(), "c".to_string(), vec![]);
        assert!(matches!(
            repo.insert(second).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_blog_list_all_newest_first() {
        let repo = InMemoryBlogRepository::new();
        let author = Uuid::new_v4();

        let mut older = Blog::new(author, "Older".to_string(), "c".to_string(), vec![]);
        older.created_at = older.created_at - chrono::TimeDelta::seconds(60);
        let newer = Blog::new(author, "Newer".to_string(), "c".to_string(), vec![]);

        repo.insert(older).await.unwrap();
        repo.insert(newer).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Newer");
        assert_eq!(all[1].title, "Older");
    }

    #[tokio::test]
    async fn test_find_by_ids_skips_missing() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.insert(user("alice", "alice@example.com")).await.unwrap();

        let found = repo.find_by_ids(&[alice.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "alice");
    }
}
