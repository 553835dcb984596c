use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::db::crud::{Creatable, Deletable, EntityStore, Readable, Updatable, touched};
use crate::entities::users;
use crate::models::{UserCreate, UserUpdate};
use crate::security::Passwords;

#[derive(Clone)]
pub struct UserRepository {
    store: EntityStore<users::Entity>,
    passwords: Passwords,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, passwords: Passwords) -> Self {
        Self {
            store: EntityStore::new(conn, users::Column::CreatedAt, users::Column::Id),
            passwords,
        }
    }

    /// Exact match against the stored email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.store.conn())
            .await
            .context("Failed to query user by email")
    }

    /// Returns the user only when the password matches. An unknown email
    /// still pays for one Argon2 verification and yields the same `None`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_email(email).await? else {
            self.passwords.verify_dummy(password).await?;
            return Ok(None);
        };

        if self.verify_password(&user, password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn verify_password(&self, user: &users::Model, password: &str) -> Result<bool> {
        self.passwords
            .verify(password, &user.hashed_password)
            .await
    }

    pub async fn set_password(&self, user: users::Model, new_password: &str) -> Result<users::Model> {
        let patch = UserUpdate {
            password: Some(new_password.to_string()),
            ..UserUpdate::default()
        };
        self.update(user, patch).await
    }
}

#[async_trait]
impl Readable for UserRepository {
    type Record = users::Model;

    async fn get(&self, id: Uuid) -> Result<Option<users::Model>> {
        self.store.find(id).await
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<users::Model>> {
        self.store.page(offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.store.count().await
    }
}

#[async_trait]
impl Creatable<UserCreate> for UserRepository {
    type Created = users::Model;

    async fn create(&self, input: UserCreate) -> Result<users::Model> {
        let hashed_password = self.passwords.hash(&input.password).await?;
        let now = Utc::now();

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            hashed_password: Set(hashed_password),
            full_name: Set(input.full_name),
            is_active: Set(input.is_active),
            is_superuser: Set(input.is_superuser),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(self.store.conn())
            .await
            .context("Failed to insert user")
    }
}

#[async_trait]
impl Updatable<UserUpdate> for UserRepository {
    async fn update(&self, existing: users::Model, patch: UserUpdate) -> Result<users::Model> {
        // Hash before touching the row so a hashing failure writes nothing
        let hashed_password = match patch.password {
            Some(password) => Some(self.passwords.hash(&password).await?),
            None => None,
        };

        let created_at = existing.created_at;
        let mut active: users::ActiveModel = existing.into();

        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(hash) = hashed_password {
            active.hashed_password = Set(hash);
        }
        if let Some(full_name) = patch.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_superuser) = patch.is_superuser {
            active.is_superuser = Set(is_superuser);
        }
        active.updated_at = Set(touched(created_at));

        active
            .update(self.store.conn())
            .await
            .context("Failed to update user")
    }
}

#[async_trait]
impl Deletable for UserRepository {
    async fn remove(&self, id: Uuid) -> Result<Option<users::Model>> {
        self.store.delete(id).await
    }
}
