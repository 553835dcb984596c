use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{BootstrapConfig, Config, StartupConfig};
use crate::models::UserCreate;
use crate::security::Passwords;

pub mod crud;
pub mod migrator;
pub mod repositories;

pub use crud::{Creatable, Deletable, EntityStore, Readable, Updatable};
pub use repositories::api_key::{ApiKeyRepository, IssuedApiKey};
pub use repositories::item::ItemRepository;
pub use repositories::user::UserRepository;

/// Display name given to the bootstrapped superuser.
pub const SUPERUSER_NAME: &str = "Superuser";

/// Process-wide handle on the connection pool. Opened once at startup and
/// closed on shutdown; repositories borrow clones of the pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    passwords: Passwords,
}

impl Store {
    pub async fn connect(config: &Config) -> Result<Self> {
        let passwords = Passwords::new(&config.security)?;
        Self::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
            passwords,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        passwords: Passwords,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        prepare_sqlite_file(db_url).await?;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn, passwords })
    }

    pub async fn ping(&self) -> Result<()> {
        ping(&self.conn).await
    }

    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.conn.clone(), self.passwords.clone())
    }

    #[must_use]
    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn api_keys(&self) -> ApiKeyRepository {
        ApiKeyRepository::new(self.conn.clone())
    }

    /// Creates the configured first superuser unless that email already exists.
    pub async fn init_superuser(&self, bootstrap: &BootstrapConfig) -> Result<()> {
        let users = self.users();

        if users.get_by_email(&bootstrap.first_superuser).await?.is_some() {
            return Ok(());
        }

        let input = UserCreate {
            full_name: Some(SUPERUSER_NAME.to_string()),
            is_superuser: true,
            ..UserCreate::regular(
                bootstrap.first_superuser.clone(),
                bootstrap.first_superuser_password.clone(),
            )
        };
        let user = users.create(input).await?;

        info!(user_id = %user.id, email = %user.email, "Created first superuser");
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database pool")
    }
}

/// Retries a single-connection `SELECT 1` until the database answers or
/// `max_tries` attempts have failed.
pub async fn wait_until_ready(db_url: &str, startup: &StartupConfig) -> Result<()> {
    prepare_sqlite_file(db_url).await?;

    let wait = Duration::from_secs(startup.wait_seconds);
    let mut last_error = None;

    for attempt in 1..=startup.max_tries {
        info!(attempt, max_tries = startup.max_tries, "Checking database readiness");

        match probe(db_url).await {
            Ok(()) => {
                info!("Database is ready");
                return Ok(());
            }
            Err(e) => {
                warn!(attempt, error = %e, "Database not ready");
                last_error = Some(e);
            }
        }

        if attempt < startup.max_tries {
            tokio::time::sleep(wait).await;
        }
    }

    let error = last_error.unwrap_or_else(|| anyhow::anyhow!("no attempts were made"));
    Err(error.context(format!(
        "Database not ready after {} attempts",
        startup.max_tries
    )))
}

async fn probe(db_url: &str) -> Result<()> {
    let mut opt = ConnectOptions::new(db_url.to_string());
    opt.max_connections(1)
        .min_connections(0)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await?;
    let result = ping(&conn).await;
    conn.close().await.ok();
    result
}

async fn ping(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    conn.query_one(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .context("Database did not answer SELECT 1")?;
    Ok(())
}

/// sqlx will not create a SQLite file by itself, so make sure it and its
/// directory exist. Other backends are left alone.
async fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    if rest.contains(":memory:") || rest.contains("mode=memory") {
        return Ok(());
    }

    let path_str = rest.trim_start_matches("//");
    let path_str = path_str.split('?').next().unwrap_or(path_str);
    let path = Path::new(path_str);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    Ok(())
}

/// True when a unique index rejected the write somewhere down the chain.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DbErr>().and_then(DbErr::sql_err),
            Some(SqlErr::UniqueConstraintViolation(_))
        )
    })
}
