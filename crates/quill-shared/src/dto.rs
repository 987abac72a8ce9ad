//! Data Transfer Objects - validated request and response types per endpoint.
//!
//! Every inbound payload has an explicit struct with a `validate()` method
//! that checks field-level constraints (length, format, enum membership)
//! before any business logic runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::domain::{
    Blog, COMMENT_MAX, CONTENT_MAX, Comment, Language, PASSWORD_MIN, Preferences, Role, TAG_MAX,
    TITLE_MAX, USERNAME_MAX, USERNAME_MIN, User,
};

// ---------------------------------------------------------------------------
// Field checks

fn check_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < USERNAME_MIN {
        return Err(format!("Username must be at least {USERNAME_MIN} characters"));
    }
    if len > USERNAME_MAX {
        return Err(format!("Username cannot exceed {USERNAME_MAX} characters"));
    }
    Ok(())
}

/// Structural email check: one `@`, a non-empty local part, and a domain
/// with at least one dot.
fn check_email(email: &str) -> Result<(), String> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err("Please provide a valid email".to_string())
    }
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN {
        Err(format!("Password must be at least {PASSWORD_MIN} characters"))
    } else {
        Ok(())
    }
}

/// Empty is allowed; otherwise digits with common separators, 7-20 chars.
fn check_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Ok(());
    }
    let len = phone.chars().count();
    let shape_ok = (7..=20).contains(&len)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '))
        && phone.chars().filter(char::is_ascii_digit).count() >= 7;
    if shape_ok {
        Ok(())
    } else {
        Err(format!("{phone} is not a valid phone number"))
    }
}

fn check_tags(tags: &[String]) -> Result<(), String> {
    for tag in tags {
        if tag.trim().chars().count() > TAG_MAX {
            return Err(format!("Tag cannot exceed {TAG_MAX} characters"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Auth requests

/// POST /api/auth/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_username(&self.username)?;
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

/// POST /api/auth/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() || self.password.is_empty() {
            Err("Please provide email and password".to_string())
        } else {
            Ok(())
        }
    }
}

/// PUT /api/auth/update-profile - all fields optional, only present ones apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(username) = &self.username {
            check_username(username)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone_number {
            check_phone(phone)?;
        }
        Ok(())
    }
}

/// PUT /api/auth/update-settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub dark_mode: Option<bool>,
    pub email_notifications: Option<bool>,
    pub language: Option<String>,
}

impl UpdateSettingsRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(language) = &self.language {
            language
                .parse::<Language>()
                .map_err(|_| format!("{language} is not a supported language"))?;
        }
        Ok(())
    }

    pub fn language(&self) -> Option<Language> {
        self.language.as_deref().and_then(|l| l.parse().ok())
    }
}

/// PUT /api/auth/change-password
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err("Please provide current and new password".to_string());
        }
        check_password(&self.new_password)
    }
}

// ---------------------------------------------------------------------------
// Blog requests

/// POST /api/blogs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateBlogRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Blog title is required".to_string());
        }
        if self.title.chars().count() > TITLE_MAX {
            return Err(format!("Title cannot exceed {TITLE_MAX} characters"));
        }
        if self.content.trim().is_empty() {
            return Err("Blog content is required".to_string());
        }
        if self.content.chars().count() > CONTENT_MAX {
            return Err(format!("Content cannot exceed {CONTENT_MAX} characters"));
        }
        check_tags(&self.tags)
    }
}

/// PUT /api/blogs/{id} - partial replace, only present fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateBlogRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("Blog title is required".to_string());
            }
            if title.chars().count() > TITLE_MAX {
                return Err(format!("Title cannot exceed {TITLE_MAX} characters"));
            }
        }
        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                return Err("Blog content is required".to_string());
            }
            if content.chars().count() > CONTENT_MAX {
                return Err(format!("Content cannot exceed {CONTENT_MAX} characters"));
            }
        }
        if let Some(tags) = &self.tags {
            check_tags(tags)?;
        }
        Ok(())
    }
}

/// POST /api/blogs/{id}/comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

impl AddCommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Comment text is required".to_string());
        }
        if self.text.trim().chars().count() > COMMENT_MAX {
            return Err(format!("Comment cannot exceed {COMMENT_MAX} characters"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Responses

/// Public author fields embedded in blog responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// The caller's own profile - auth responses and GET /api/auth/me.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub phone_number: String,
    pub role: Role,
    pub preferences: Preferences,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            preferences: user.preferences.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Token plus profile, returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Profile wrapper returned by the profile/settings update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

/// Comment author fields resolved into comment views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
}

impl From<&User> for CommentAuthor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A comment with its author resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub user: Option<CommentAuthor>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: &Comment, author: Option<&User>) -> Self {
        Self {
            id: comment.id,
            user: author.map(CommentAuthor::from),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

/// A blog with author and comment authors resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub summary: Option<String>,
    pub status: String,
    pub tags: Vec<String>,
    pub author: Option<UserPublic>,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub comments: Vec<CommentView>,
    pub comment_count: usize,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    /// Assemble a response from the aggregate and a resolver for the users
    /// it references (the author and each comment's author).
    pub fn assemble<'a, F>(blog: &Blog, resolve: F) -> Self
    where
        F: Fn(Uuid) -> Option<&'a User>,
    {
        let comments: Vec<CommentView> = blog
            .comments
            .iter()
            .map(|c| CommentView::new(c, resolve(c.user_id)))
            .collect();

        Self {
            id: blog.id,
            title: blog.title.clone(),
            slug: blog.slug.clone(),
            content: blog.content.clone(),
            summary: blog.summary.clone(),
            status: blog.status.as_str().to_string(),
            tags: blog.tags.clone(),
            author: resolve(blog.author_id).map(UserPublic::from),
            likes: blog.likes.clone(),
            like_count: blog.likes.len(),
            comment_count: comments.len(),
            comments,
            view_count: blog.view_count,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_rejects_bad_fields() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short_name = RegisterRequest {
            username: "al".to_string(),
            ..ok.clone()
        };
        assert!(short_name.validate().is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "abc".to_string(),
            ..ok
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn settings_request_checks_language_membership() {
        let ok = UpdateSettingsRequest {
            language: Some("fr".to_string()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.language(), Some(Language::Fr));

        let bad = UpdateSettingsRequest {
            language: Some("tlh".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn create_blog_request_enforces_limits() {
        let ok = CreateBlogRequest {
            title: "A title".to_string(),
            content: "Some content".to_string(),
            tags: vec!["rust".to_string()],
        };
        assert!(ok.validate().is_ok());

        let long_title = CreateBlogRequest {
            title: "t".repeat(TITLE_MAX + 1),
            ..ok.clone()
        };
        assert!(long_title.validate().is_err());

        let long_tag = CreateBlogRequest {
            tags: vec!["x".repeat(TAG_MAX + 1)],
            ..ok
        };
        assert!(long_tag.validate().is_err());
    }

    #[test]
    fn profile_serialization_never_includes_the_hash() {
        let user = User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$2b$12$secret-hash".to_string(),
        );
        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password"));
        assert!(json.contains("avatarUrl"));
    }

    #[test]
    fn phone_check_accepts_empty_and_common_shapes() {
        let req = UpdateProfileRequest {
            phone_number: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdateProfileRequest {
            phone_number: Some("+1 (555) 123-4567".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdateProfileRequest {
            phone_number: Some("not a phone".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
