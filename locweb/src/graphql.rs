//! The GraphQL schema and the HTTP/WebSocket routes that serve it.
//!
//! The query root is assembled from [QUERY_FIELDS], a table with one entry per
//! field naming its arguments and the resolver that produces the locations.
use crate::{error::Error, state::AppState};
use async_graphql::{
    Value,
    dynamic::{
        Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, Schema,
        SchemaBuilder, Subscription, SubscriptionField, SubscriptionFieldFuture, TypeRef,
    },
    http::{ALL_WEBSOCKET_PROTOCOLS, GraphQLPlaygroundConfig, playground_source},
};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use futures::{FutureExt, future::BoxFuture, stream};
use liblocation::{location::Location, service::LocationQueries};
use std::collections::HashMap;
use tracing::trace;

pub(crate) const GRAPHQL_PATH: &str = "/graphql";
pub(crate) const GRAPHQL_WS_PATH: &str = "/graphql/ws";
pub(crate) const PLAYGROUND_PATH: &str = "/playground";

const QUERY_TYPE: &str = "Query";
const SUBSCRIPTION_TYPE: &str = "Subscription";
const LOCATION_TYPE: &str = "Location";

pub type LocationSchema = Schema;

/// Field arguments by name
type Args = HashMap<&'static str, String>;

type LocationsFuture = BoxFuture<'static, async_graphql::Result<Vec<Location>>>;

type Resolver = fn(LocationQueries, Args) -> LocationsFuture;

/// A field on the query root. All arguments are required strings.
///
/// Every entry is also exposed on the subscription root, where it yields its
/// result once and completes, so clients connected over a WebSocket can use
/// the same operations.
struct QueryField {
    name: &'static str,
    description: &'static str,
    arguments: &'static [&'static str],
    resolve: Resolver,
}

const QUERY_FIELDS: &[QueryField] = &[
    QueryField {
        name: "locations",
        description: "All locations, sorted by name",
        arguments: &[],
        resolve: list_locations,
    },
    QueryField {
        name: "location",
        description: "All locations with exactly the given code, sorted by name",
        arguments: &["code"],
        resolve: find_locations_by_code,
    },
];

fn list_locations(queries: LocationQueries, _args: Args) -> LocationsFuture {
    async move { Ok::<_, async_graphql::Error>(queries.list_locations().await?) }.boxed()
}

fn find_locations_by_code(queries: LocationQueries, mut args: Args) -> LocationsFuture {
    async move {
        let code = args.remove("code").ok_or("missing argument 'code'")?;
        Ok::<_, async_graphql::Error>(queries.find_locations_by_code(&code).await?)
    }
    .boxed()
}

/// Collects the arguments of `entry` from the request and starts its resolver
fn resolve(
    entry: &'static QueryField,
    ctx: &ResolverContext,
) -> async_graphql::Result<LocationsFuture> {
    trace!("resolving field '{}'", entry.name);
    let queries = ctx.data::<LocationQueries>()?.clone();
    let args = entry
        .arguments
        .iter()
        .map(|name| -> async_graphql::Result<(&'static str, String)> {
            Ok((*name, ctx.args.try_get(name)?.string()?.to_string()))
        })
        .collect::<async_graphql::Result<Args>>()?;
    Ok((entry.resolve)(queries, args))
}

fn location_list<'a>(locations: Vec<Location>) -> FieldValue<'a> {
    FieldValue::list(locations.into_iter().map(FieldValue::owned_any))
}

fn arguments(entry: &QueryField) -> impl Iterator<Item = InputValue> + '_ {
    entry
        .arguments
        .iter()
        .map(|arg| InputValue::new(*arg, TypeRef::named_nn(TypeRef::STRING)))
}

fn query_field(entry: &'static QueryField) -> Field {
    let field = Field::new(entry.name, TypeRef::named_nn_list(LOCATION_TYPE), move |ctx| {
        FieldFuture::new(async move {
            let locations = resolve(entry, &ctx)?.await?;
            Ok(Some(location_list(locations)))
        })
    })
    .description(entry.description);
    arguments(entry).fold(field, Field::argument)
}

fn subscription_field(entry: &'static QueryField) -> SubscriptionField {
    let field = SubscriptionField::new(
        entry.name,
        TypeRef::named_nn_list(LOCATION_TYPE),
        move |ctx| {
            SubscriptionFieldFuture::new(async move {
                let locations = resolve(entry, &ctx)?;
                Ok(stream::once(locations.map(|res| res.map(location_list))))
            })
        },
    )
    .description(entry.description);
    arguments(entry).fold(field, SubscriptionField::argument)
}

fn location_field(name: &str, ty: &str, get: fn(&Location) -> Value) -> Field {
    Field::new(name, TypeRef::named_nn(ty), move |ctx| {
        FieldFuture::new(async move {
            let location = ctx.parent_value.try_downcast_ref::<Location>()?;
            Ok(Some(FieldValue::value(get(location))))
        })
    })
}

fn location_type() -> Object {
    Object::new(LOCATION_TYPE)
        .description("A location stored in the database")
        .field(location_field("id", TypeRef::INT, |l| Value::from(l.id)))
        .field(location_field("name", TypeRef::STRING, |l| {
            Value::from(l.name.clone())
        }))
        .field(location_field("code", TypeRef::STRING, |l| {
            Value::from(l.code.clone())
        }))
        .field(location_field("active", TypeRef::BOOLEAN, |l| {
            Value::from(l.active)
        }))
}

/// Registers all types, query fields and subscription fields. The returned
/// builder has no data attached, which is enough for exporting the schema.
pub(crate) fn schema_builder() -> SchemaBuilder {
    let query = QUERY_FIELDS
        .iter()
        .fold(Object::new(QUERY_TYPE), |query, entry| {
            query.field(query_field(entry))
        });
    let subscription = QUERY_FIELDS
        .iter()
        .fold(Subscription::new(SUBSCRIPTION_TYPE), |subscription, entry| {
            subscription.field(subscription_field(entry))
        });
    Schema::build(QUERY_TYPE, None, Some(SUBSCRIPTION_TYPE))
        .register(location_type())
        .register(query)
        .register(subscription)
}

/// Create the GraphQL schema, resolving queries with the given [LocationQueries]
pub fn build_schema(queries: LocationQueries) -> Result<LocationSchema, Error> {
    Ok(schema_builder().data(queries).finish()?)
}

/// The schema in GraphQL schema definition language
pub(crate) fn sdl() -> Result<String, Error> {
    Ok(schema_builder().finish()?.sdl())
}

pub fn router(playground: bool) -> Router<AppState> {
    let router = Router::new()
        .route(GRAPHQL_PATH, get(graphql_handler).post(graphql_handler))
        .route(GRAPHQL_WS_PATH, get(graphql_ws_handler));
    if playground {
        router.route(PLAYGROUND_PATH, get(graphql_playground))
    } else {
        router
    }
}

async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

async fn graphql_ws_handler(
    State(state): State<AppState>,
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
) -> Response {
    let schema = state.schema.clone();
    upgrade
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |stream| GraphQLWebSocket::new(stream, schema, protocol).serve())
}

async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(
        GraphQLPlaygroundConfig::new(GRAPHQL_PATH).subscription_endpoint(GRAPHQL_WS_PATH),
    ))
}
