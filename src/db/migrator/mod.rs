use sea_orm_migration::prelude::*;

mod m20250301_create_users;
mod m20250301_create_items;
mod m20250418_create_api_keys;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_create_users::Migration),
            Box::new(m20250301_create_items::Migration),
            Box::new(m20250418_create_api_keys::Migration),
        ]
    }
}
