use serde::Deserialize;

use super::deserialize_some;

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl UserCreate {
    /// An active, non-superuser account; the shape self-service signup produces.
    #[must_use]
    pub fn regular(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: None,
            is_active: true,
            is_superuser: false,
        }
    }
}

/// Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext; hashed before it reaches the row.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub full_name: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
}

const fn default_true() -> bool {
    true
}
