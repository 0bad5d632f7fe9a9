//! This is a library that provides read access to a database of locations: the
//! [Location](location::Location) record, the [Database] handle and the
//! [LocationQueries](service::LocationQueries) used by the GraphQL server.

pub mod database;
pub mod error;
pub mod location;
pub mod query;
pub mod service;

pub use database::Database;
pub use error::Error;
pub use error::Result;
