use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::crud::{Creatable, Deletable, EntityStore, Readable, Updatable, touched};
use crate::entities::items;
use crate::models::{ItemCreate, ItemUpdate};

#[derive(Clone)]
pub struct ItemRepository {
    store: EntityStore<items::Entity>,
}

impl ItemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(conn, items::Column::CreatedAt, items::Column::Id),
        }
    }

    /// Titles are not unique, so this can match several items.
    pub async fn get_by_title(&self, title: &str) -> Result<Vec<items::Model>> {
        items::Entity::find()
            .filter(items::Column::Title.eq(title))
            .order_by_asc(items::Column::CreatedAt)
            .order_by_asc(items::Column::Id)
            .all(self.store.conn())
            .await
            .context("Failed to query items by title")
    }
}

#[async_trait]
impl Readable for ItemRepository {
    type Record = items::Model;

    async fn get(&self, id: Uuid) -> Result<Option<items::Model>> {
        self.store.find(id).await
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<items::Model>> {
        self.store.page(offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.store.count().await
    }
}

#[async_trait]
impl Creatable<ItemCreate> for ItemRepository {
    type Created = items::Model;

    async fn create(&self, input: ItemCreate) -> Result<items::Model> {
        let now = Utc::now();

        items::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.store.conn())
        .await
        .context("Failed to insert item")
    }
}

#[async_trait]
impl Updatable<ItemUpdate> for ItemRepository {
    async fn update(&self, existing: items::Model, patch: ItemUpdate) -> Result<items::Model> {
        let created_at = existing.created_at;
        let mut active: items::ActiveModel = existing.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        active.updated_at = Set(touched(created_at));

        active
            .update(self.store.conn())
            .await
            .context("Failed to update item")
    }
}

#[async_trait]
impl Deletable for ItemRepository {
    async fn remove(&self, id: Uuid) -> Result<Option<items::Model>> {
        self.store.delete(id).await
    }
}
