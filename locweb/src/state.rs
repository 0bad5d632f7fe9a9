use crate::{
    config::{DEFAULT_CONNECTION, EnvConfig},
    graphql::{self, LocationSchema},
};
use anyhow::{Context, Result};
use liblocation::{Database, service::LocationQueries};
use std::sync::Arc;
use tracing::trace;

pub struct SharedState {
    pub schema: LocationSchema,
    pub config: EnvConfig,
}

impl SharedState {
    pub async fn new(env: EnvConfig) -> Result<Self> {
        trace!("Creating shared app state");
        let connection_string = env.connection_string(DEFAULT_CONNECTION)?;
        let db = Database::open(&connection_string)
            .await
            .with_context(|| format!("Unable to open database {connection_string}"))?;
        Ok(Self {
            schema: graphql::build_schema(LocationQueries::new(db))?,
            config: env,
        })
    }

    #[cfg(test)]
    pub fn test(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        tracing::debug!("Creating test shared app state");
        Self {
            schema: graphql::build_schema(LocationQueries::new(Database::from(pool)))
                .expect("failed to build schema"),
            config: EnvConfig {
                listen: crate::config::ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                connection_strings: Default::default(),
                playground: true,
            },
        }
    }
}

pub type AppState = Arc<SharedState>;
