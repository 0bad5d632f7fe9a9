//! Objects to manage the locations stored in the database
use crate::{
    Database,
    error::{Error, Result},
    query::{DynFilterPart, FilterPart},
};
use sqlx::{QueryBuilder, Sqlite, sqlite::SqliteQueryResult};
use std::sync::Arc;

/// A type for specifying fields that can be used for filtering a database query
/// for locations
#[derive(Clone, Debug)]
pub enum Filter {
    /// Match the ID of the location to the given value
    Id(i32),

    /// Match the short code of the location exactly (case-sensitive)
    Code(String),
}

impl From<Filter> for DynFilterPart {
    fn from(value: Filter) -> Self {
        Arc::new(value)
    }
}

impl From<Filter> for Option<DynFilterPart> {
    fn from(value: Filter) -> Self {
        Some(Arc::new(value))
    }
}

impl FilterPart for Filter {
    fn add_to_query(&self, builder: &mut sqlx::QueryBuilder<sqlx::Sqlite>) {
        match self {
            Self::Id(id) => _ = builder.push(" L.ID = ").push_bind(*id),
            Self::Code(code) => _ = builder.push(" L.Code = ").push_bind(code.clone()),
        }
    }
}

/// A single row of the `Locations` table.
///
/// Values returned from the database are plain owned copies of the row. Nothing
/// keeps track of them after they are loaded.
#[derive(Debug, sqlx::FromRow, PartialEq, Clone)]
pub struct Location {
    /// A unique ID that identifies this location in the database. It is
    /// generated by the database when the location is inserted.
    #[sqlx(rename = "ID")]
    pub id: i32,

    /// The name of the location (at most 50 characters)
    #[sqlx(rename = "Name")]
    pub name: String,

    /// A short code for the location (at most 5 characters)
    #[sqlx(rename = "Code")]
    pub code: String,

    /// Whether the location is currently active
    #[sqlx(rename = "Active")]
    pub active: bool,
}

impl Location {
    fn build_query(filter: Option<DynFilterPart>) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT L.ID, L.Name, L.Code, L.Active FROM Locations L");
        if let Some(f) = filter {
            qb.push(" WHERE ");
            f.add_to_query(&mut qb);
        }
        qb.push(" ORDER BY L.Name ASC");
        qb
    }

    /// The id used for locations that have not been inserted into the database yet
    pub fn invalid_id() -> i32 {
        -1
    }

    /// Loads the location with the given id from the database
    pub async fn load(id: i32, db: &Database) -> Result<Location> {
        Self::build_query(Filter::Id(id).into())
            .build_query_as()
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Loads all matching locations from the database, sorted by name
    pub async fn load_all(filter: Option<DynFilterPart>, db: &Database) -> Result<Vec<Location>> {
        Self::build_query(filter)
            .build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Add this location to the database. If this call completes successfully,
    /// the id of this object will be updated to the ID of the inserted row in the
    /// database. A row id outside the range of a location id is reported as
    /// [Error::InvalidRowId] and leaves the id of this object unchanged.
    pub async fn insert(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id != Self::invalid_id() {
            return Err(Error::InvalidInsertObjectAlreadyExists(self.id));
        }

        let res = sqlx::query(r#"INSERT INTO Locations (Name, Code, Active) VALUES (?, ?, ?)"#)
            .bind(&self.name)
            .bind(&self.code)
            .bind(self.active)
            .execute(db.pool())
            .await?;
        let rowid = res.last_insert_rowid();
        self.id = i32::try_from(rowid).map_err(|_| Error::InvalidRowId(rowid))?;
        Ok(res)
    }

    /// Creates a new location object with the given data. It will initially have
    /// an invalid ID until it is inserted into the database
    pub fn new(name: String, code: String, active: bool) -> Self {
        Self {
            id: Self::invalid_id(),
            name,
            code,
            active,
        }
    }
}
