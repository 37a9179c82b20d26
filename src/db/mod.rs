//! Database module providing connection management and repository queries.
//!
//! Repository functions are generic over [`ConnectionTrait`] so the same query
//! runs against the shared pool or inside a [`sea_orm::DatabaseTransaction`].

pub mod applications;
pub mod files;

use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait,
    QuerySelect, Select,
};
use tracing::info;

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult};

/// Process-wide database handle.
///
/// Cloning is cheap; every clone shares the same underlying pool.
#[derive(Clone, Debug)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured database settings.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (max {} connections)",
            settings.max_connections
        );

        Ok(Self { conn })
    }

    /// Wrap an already established connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Check the database answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn.ping().await?;
        Ok(())
    }
}

/// Add a `FOR UPDATE` row lock to a select.
///
/// SQLite has no row locks; its transactions already serialize writers, so the
/// clause is left out there.
pub(crate) fn for_update<E, C>(select: Select<E>, db: &C) -> Select<E>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if db.get_database_backend() == DbBackend::Sqlite {
        select
    } else {
        select.lock_exclusive()
    }
}
