use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::IssuedApiKey;
use crate::entities::{api_keys, items, users};

pub const DEFAULT_LIMIT: i64 = 100;

/// `{data, count}` where `count` is the total row count, not the page size.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn new<M>(rows: Vec<M>, count: u64) -> Self
    where
        T: From<M>,
    {
        Self {
            data: rows.into_iter().map(T::from).collect(),
            count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub title: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

/// A user as the outside world sees it; never carries password material.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for UserPublic {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateMe {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::models::deserialize_some")]
    pub full_name: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct PrivateUserCreate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ItemPublic {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<items::Model> for ItemPublic {
    fn from(item: items::Model) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

// ============================================================================
// API keys
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiKeyPublic {
    pub id: Uuid,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<api_keys::Model> for ApiKeyPublic {
    fn from(key: api_keys::Model) -> Self {
        Self {
            id: key.id,
            name: key.name,
            expires_at: key.expires_at,
            is_active: key.is_active,
            created_at: key.created_at,
        }
    }
}

/// Returned once, at creation. `key` is the raw secret.
#[derive(Debug, Serialize)]
pub struct ApiKeyCreated {
    #[serde(flatten)]
    pub public: ApiKeyPublic,
    pub key: String,
}

impl From<IssuedApiKey> for ApiKeyCreated {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            public: issued.record.into(),
            key: issued.secret,
        }
    }
}
