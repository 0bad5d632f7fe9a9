//! utilities related to database queries
//!
use std::sync::Arc;

/// A reference-counted filter expression that can be shared between queries
pub type DynFilterPart = Arc<dyn FilterPart + Sync>;

/// A Trait implemented by anything that can be a filter on a database query
pub trait FilterPart: Send {
    /// convert the given filter part to SQL syntax and add it to the given [sqlx::QueryBuilder] object
    fn add_to_query(&self, builder: &mut sqlx::QueryBuilder<sqlx::Sqlite>);
}
