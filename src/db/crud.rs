//! Generic CRUD seams shared by every repository.
//!
//! Each capability is its own trait so a repository only exposes what its
//! entity supports (API keys, for instance, are never updated through the
//! generic path). `EntityStore` supplies the read/count/remove half for any
//! sea-orm entity keyed by a UUID.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryOrder, QuerySelect,
    TransactionTrait,
};
use std::marker::PhantomData;
use uuid::Uuid;

#[async_trait]
pub trait Readable: Send + Sync {
    type Record: Send;

    async fn get(&self, id: Uuid) -> Result<Option<Self::Record>>;

    /// Stable order: creation time, then id.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Self::Record>>;

    /// Total rows, independent of any pagination.
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait Creatable<In: Send + 'static>: Readable {
    /// Usually `Self::Record`; API keys also hand back their one-time secret.
    type Created: Send;

    /// Assigns id and timestamps, persists, returns the stored row.
    async fn create(&self, input: In) -> Result<Self::Created>;
}

#[async_trait]
pub trait Updatable<Patch: Send + 'static>: Readable {
    /// Writes only the fields present in `patch`.
    async fn update(&self, existing: Self::Record, patch: Patch) -> Result<Self::Record>;
}

#[async_trait]
pub trait Deletable: Readable {
    /// Returns the removed row, or `None` if nothing matched.
    async fn remove(&self, id: Uuid) -> Result<Option<Self::Record>>;
}

pub struct EntityStore<E: EntityTrait> {
    conn: DatabaseConnection,
    created_at: E::Column,
    id: E::Column,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            created_at: self.created_at,
            id: self.id,
            _entity: PhantomData,
        }
    }
}

impl<E> EntityStore<E>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    #[must_use]
    pub const fn new(conn: DatabaseConnection, created_at: E::Column, id: E::Column) -> Self {
        Self {
            conn,
            created_at,
            id,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<E::Model>> {
        E::find_by_id(id)
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to query {} by id", table_name::<E>()))
    }

    pub async fn page(&self, offset: u64, limit: u64) -> Result<Vec<E::Model>> {
        E::find()
            .order_by_asc(self.created_at)
            .order_by_asc(self.id)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .with_context(|| format!("Failed to list {}", table_name::<E>()))
    }

    pub async fn count(&self) -> Result<u64> {
        E::find()
            .count(&self.conn)
            .await
            .with_context(|| format!("Failed to count {}", table_name::<E>()))
    }

    /// Find and delete in one transaction; dropping the transaction on an
    /// error path rolls it back.
    pub async fn delete(&self, id: Uuid) -> Result<Option<E::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        let Some(model) = E::find_by_id(id)
            .one(&txn)
            .await
            .with_context(|| format!("Failed to query {} by id", table_name::<E>()))?
        else {
            return Ok(None);
        };

        E::delete_by_id(id)
            .exec(&txn)
            .await
            .with_context(|| format!("Failed to delete from {}", table_name::<E>()))?;

        txn.commit().await.context("Failed to commit delete")?;

        Ok(Some(model))
    }
}

/// `updated_at` for a write: now, but never earlier than `created_at`.
#[must_use]
pub fn touched(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_owned()
}
