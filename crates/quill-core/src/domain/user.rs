use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;

pub const DEFAULT_AVATAR: &str = "avatar1.png";

/// User role - plain users and admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// UI language - the fixed set the frontend ships translations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Ja,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Ja => "ja",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            "ja" => Ok(Language::Ja),
            _ => Err(()),
        }
    }
}

/// Per-user UI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub email_notifications: bool,
    pub language: Language,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            email_notifications: true,
            language: Language::En,
        }
    }
}

/// User entity. The password is held only as a one-way hash and is never
/// serialized; responses go through the DTO layer which omits it entirely.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub phone_number: String,
    pub role: Role,
    pub preferences: Preferences,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and defaults.
    /// The email is stored lowercased; `password_hash` must already be hashed.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email: email.to_lowercase(),
            password_hash,
            avatar_url: DEFAULT_AVATAR.to_string(),
            phone_number: String::new(),
            role: Role::User,
            preferences: Preferences::default(),
            last_login: None,
            is_active: true,
            password_changed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Replace the password hash. The change timestamp is backdated one
    /// second so a token minted in the same second as the change stays valid.
    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.password_changed_at = Some(Utc::now() - TimeDelta::seconds(1));
    }

    /// Record a successful login.
    pub fn record_login(&mut self) {
        self.last_login = Some(Utc::now());
    }
}
