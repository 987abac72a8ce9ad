use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const TITLE_MAX: usize = 100;
pub const CONTENT_MAX: usize = 50_000;
pub const SUMMARY_MAX: usize = 200;
pub const TAG_MAX: usize = 20;
pub const COMMENT_MAX: usize = 500;

/// Blog lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Published => "published",
            BlogStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for BlogStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BlogStatus::Draft),
            "published" => Ok(BlogStatus::Published),
            "archived" => Ok(BlogStatus::Archived),
            _ => Err(()),
        }
    }
}

/// A comment embedded in a blog's comment collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Blog aggregate: the post itself plus its embedded comments and like set.
/// All mutations refresh `updated_at`.
#[derive(Debug, Clone)]
pub struct Blog {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub summary: Option<String>,
    pub status: BlogStatus,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Create a new draft with a slug derived from the title and a summary
    /// derived from the content.
    pub fn new(author_id: Uuid, title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();
        let slug = slug::slugify(&title);
        let summary = derive_summary(&content);

        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug,
            content,
            summary: Some(summary),
            status: BlogStatus::Draft,
            tags: normalize_tags(tags),
            likes: Vec::new(),
            comments: Vec::new(),
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Rename the post. The slug is regenerated and, because this runs only
    /// on already-persisted posts, suffixed with a time-derived token to
    /// keep it globally unique.
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        let millis = Utc::now().timestamp_millis().to_string();
        let token = &millis[millis.len().saturating_sub(4)..];
        self.slug = format!("{}-{}", slug::slugify(&self.title), token);
        self.touch();
    }

    /// Replace the content, deriving a summary when none is set.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
        if self.summary.as_deref().is_none_or(str::is_empty) {
            self.summary = Some(derive_summary(&self.content));
        }
        self.touch();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = normalize_tags(tags);
        self.touch();
    }

    /// Count a read. Like every other mutation this refreshes `updated_at`.
    pub fn record_view(&mut self) {
        self.view_count += 1;
        self.touch();
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    /// Flip the user's membership in the like set.
    /// Returns `true` when the post is liked after the call.
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        let liked = match self.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                self.likes.remove(index);
                false
            }
            None => {
                self.likes.push(user_id);
                true
            }
        };
        self.touch();
        liked
    }

    /// Append a comment with a server-assigned id and timestamp.
    /// The text is trimmed; empty or oversized text is rejected.
    pub fn add_comment(&mut self, user_id: Uuid, text: &str) -> Result<Uuid, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation(
                "Comment text is required".to_string(),
            ));
        }
        if text.chars().count() > COMMENT_MAX {
            return Err(DomainError::Validation(format!(
                "Comment cannot exceed {COMMENT_MAX} characters"
            )));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let id = comment.id;
        self.comments.push(comment);
        self.touch();
        Ok(id)
    }

    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Remove a comment by id, returning it when present.
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let index = self.comments.iter().position(|c| c.id == comment_id)?;
        let comment = self.comments.remove(index);
        self.touch();
        Some(comment)
    }
}

/// Lowercase and trim tags, dropping empties and truncating to the limit.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(TAG_MAX).collect())
        .collect()
}

/// First 197 characters of the content with HTML tags stripped, plus an
/// ellipsis. Matches the source's summary derivation, capped under 200.
pub fn derive_summary(content: &str) -> String {
    let mut stripped = String::with_capacity(content.len().min(SUMMARY_MAX));
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let mut summary: String = stripped.chars().take(SUMMARY_MAX - 3).collect();
    summary.push_str("...");
    summary
}
