use crate::error::Result;
use sqlx::{Pool, Sqlite, SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;
use tracing::{debug, trace};

/// An object that represents a connection to the location database
#[derive(Clone, Debug)]
pub struct Database(Pool<Sqlite>);

impl From<Pool<Sqlite>> for Database {
    /// **WARNING**: This is primarily intended for tests. You should probably
    /// use [Database::open()] instead of creating the pool yourself, since
    /// [Database::open()] will perform database schema migration automatically.
    fn from(value: Pool<Sqlite>) -> Self {
        Self(value)
    }
}

impl Database {
    /// Open a connection to the database described by the given connection
    /// string (e.g. `sqlite://locations.sqlite`). The database file is created
    /// if it does not exist yet. This will also perform any necessary sql
    /// migrations to ensure that the database is up to date with the latest
    /// schema changes.
    pub async fn open(connection_string: &str) -> Result<Self> {
        debug!("Opening database {connection_string}");
        let options = SqliteConnectOptions::from_str(connection_string)?.create_if_missing(true);
        let dbpool = SqlitePool::connect_with(options).await?;
        trace!("Running database migrations");
        sqlx::migrate!("../db/migrations").run(&dbpool).await?;
        Ok(Database(dbpool))
    }

    /// gets a reference to the underlying sqlx connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.0
    }
}
