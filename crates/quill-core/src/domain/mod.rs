//! Domain entities - the core business objects.

mod blog;
pub mod policy;
mod user;

pub use blog::{
    Blog, BlogStatus, COMMENT_MAX, CONTENT_MAX, Comment, SUMMARY_MAX, TAG_MAX, TITLE_MAX,
    derive_summary,
};
pub use user::{
    DEFAULT_AVATAR, Language, PASSWORD_MIN, Preferences, Role, USERNAME_MAX, USERNAME_MIN, User,
};
