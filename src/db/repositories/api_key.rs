use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::db::crud::{Creatable, EntityStore, Readable, touched};
use crate::entities::api_keys;
use crate::models::ApiKeyCreate;
use crate::security::{digest_secret, generate_secret};

/// A freshly created key together with its raw secret. The secret exists
/// only here; the row keeps its digest.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub record: api_keys::Model,
    pub secret: String,
}

/// API keys are created and deactivated, never edited or hard-deleted.
#[derive(Clone)]
pub struct ApiKeyRepository {
    store: EntityStore<api_keys::Entity>,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(conn, api_keys::Column::CreatedAt, api_keys::Column::Id),
        }
    }

    /// Looks up an active key by its raw secret. Only the digest reaches the
    /// query. Expiry is left to the caller.
    pub async fn get_active_by_secret(&self, secret: &str) -> Result<Option<api_keys::Model>> {
        api_keys::Entity::find()
            .filter(api_keys::Column::KeyHash.eq(digest_secret(secret)))
            .filter(api_keys::Column::IsActive.eq(true))
            .one(self.store.conn())
            .await
            .context("Failed to query API key")
    }

    pub async fn deactivate(&self, key: api_keys::Model) -> Result<api_keys::Model> {
        let created_at = key.created_at;
        let mut active: api_keys::ActiveModel = key.into();
        active.is_active = Set(false);
        active.updated_at = Set(touched(created_at));

        active
            .update(self.store.conn())
            .await
            .context("Failed to deactivate API key")
    }
}

#[async_trait]
impl Readable for ApiKeyRepository {
    type Record = api_keys::Model;

    async fn get(&self, id: Uuid) -> Result<Option<api_keys::Model>> {
        self.store.find(id).await
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<api_keys::Model>> {
        self.store.page(offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.store.count().await
    }
}

#[async_trait]
impl Creatable<ApiKeyCreate> for ApiKeyRepository {
    type Created = IssuedApiKey;

    async fn create(&self, input: ApiKeyCreate) -> Result<IssuedApiKey> {
        let secret = generate_secret();
        let now = Utc::now();

        let record = api_keys::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            key_hash: Set(digest_secret(&secret)),
            expires_at: Set(input.expires_at),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.store.conn())
        .await
        .context("Failed to insert API key")?;

        Ok(IssuedApiKey { record, secret })
    }
}
