//! Blog entity for SeaORM.
//!
//! Tags, likes, and comments live in JSONB columns so each blog is a
//! single row and every save is one atomic write.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::Blog;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub summary: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Json,
    pub view_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Blog.
/// Malformed JSON columns decode to empty collections rather than
/// failing the read.
impl From<Model> for Blog {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            summary: model.summary,
            status: model.status.parse().unwrap_or_default(),
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            likes: serde_json::from_value(model.likes).unwrap_or_default(),
            comments: serde_json::from_value(model.comments).unwrap_or_default(),
            view_count: model.view_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Blog to SeaORM ActiveModel.
impl From<Blog> for ActiveModel {
    fn from(blog: Blog) -> Self {
        Self {
            id: Set(blog.id),
            author_id: Set(blog.author_id),
            title: Set(blog.title),
            slug: Set(blog.slug),
            content: Set(blog.content),
            summary: Set(blog.summary),
            status: Set(blog.status.as_str().to_string()),
            tags: Set(serde_json::to_value(&blog.tags).unwrap_or_default()),
            likes: Set(serde_json::to_value(&blog.likes).unwrap_or_default()),
            comments: Set(serde_json::to_value(&blog.comments).unwrap_or_default()),
            view_count: Set(blog.view_count),
            created_at: Set(blog.created_at.into()),
            updated_at: Set(blog.updated_at.into()),
        }
    }
}
