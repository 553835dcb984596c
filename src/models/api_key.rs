use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyCreate {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
