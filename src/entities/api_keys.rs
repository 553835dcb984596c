use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Hex SHA-256 digest of the secret; the secret itself is never stored.
    #[sea_orm(unique)]
    pub key_hash: String,

    pub expires_at: Option<DateTimeUtc>,

    pub is_active: bool,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    /// A key without `expires_at` never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
