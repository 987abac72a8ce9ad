//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::{Preferences, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub phone_number: String,
    pub role: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub preferences: Json,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub is_active: bool,
    pub password_changed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain User.
/// Unknown role or malformed preferences fall back to defaults rather
/// than failing the read.
impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            avatar_url: model.avatar_url,
            phone_number: model.phone_number,
            role: model.role.parse().unwrap_or_default(),
            preferences: serde_json::from_value(model.preferences)
                .unwrap_or_else(|_| Preferences::default()),
            last_login: model.last_login.map(Into::into),
            is_active: model.is_active,
            password_changed_at: model.password_changed_at.map(Into::into),
            created_at: model.created_at.into(),
        }
    }
}

/// Conversion from Domain User to SeaORM ActiveModel.
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        Self {
            id: Set(user.id),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            avatar_url: Set(user.avatar_url),
            phone_number: Set(user.phone_number),
            role: Set(user.role.as_str().to_string()),
            preferences: Set(serde_json::to_value(&user.preferences).unwrap_or_default()),
            last_login: Set(user.last_login.map(Into::into)),
            is_active: Set(user.is_active),
            password_changed_at: Set(user.password_changed_at.map(Into::into)),
            created_at: Set(user.created_at.into()),
        }
    }
}
