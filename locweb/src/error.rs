#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("The environment is not set up correctly: {0}")]
    Environment(String),
    #[error("No connection string named '{0}' is configured")]
    MissingConnectionString(String),
    #[error("Unable to build the GraphQL schema: {0}")]
    Schema(String),
}

impl From<async_graphql::dynamic::SchemaError> for Error {
    fn from(value: async_graphql::dynamic::SchemaError) -> Self {
        Error::Schema(value.0)
    }
}
