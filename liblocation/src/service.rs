//! Read-only queries over the locations in the database
use crate::{
    Database,
    error::Result,
    location::{Filter, Location},
};
use tracing::debug;

/// Provides the read operations that are exposed to clients. Every call is a
/// single query against the database; results are detached copies sorted by
/// location name.
#[derive(Clone, Debug)]
pub struct LocationQueries {
    db: Database,
}

impl LocationQueries {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns all locations, sorted by name
    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        debug!("listing all locations");
        Location::load_all(None, &self.db).await
    }

    /// Returns all locations whose code is exactly `code`, sorted by name. The
    /// code is passed to the database as-is, so an empty or overly long code
    /// simply matches nothing.
    pub async fn find_locations_by_code(&self, code: &str) -> Result<Vec<Location>> {
        debug!("finding locations with code {code:?}");
        Location::load_all(Filter::Code(code.to_string()).into(), &self.db).await
    }
}
