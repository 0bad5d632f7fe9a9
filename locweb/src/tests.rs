use crate::{app, graphql, state::SharedState};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE, header::LOCATION},
};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::json;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use test_log::test;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};
use tower::Service;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_app(pool: Pool<Sqlite>, playground: bool) -> Router {
    let mut state = SharedState::test(pool);
    state.config.playground = playground;
    app(Arc::new(state))
}

async fn post_query(app: &mut Router, query: &str) -> (StatusCode, serde_json::Value) {
    let body = serde_json::to_string(&json!({ "query": query })).expect("failed to encode query");
    let request = Request::builder()
        .uri(graphql::GRAPHQL_PATH)
        .method("POST")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to collect body")
        .to_bytes();
    (
        status,
        serde_json::from_slice(&bytes).expect("response should be json"),
    )
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../db/fixtures", scripts("locations"))
))]
async fn test_post_graphql(pool: Pool<Sqlite>) {
    let mut app = test_app(pool, true);

    let (status, body) = post_query(&mut app, "{ locations { code } }").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": {"locations": [{"code": "AUS"}, {"code": "BOS"}]}})
    );

    let (status, body) = post_query(&mut app, r#"{ location(code: "BOS") { name active } }"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": {"location": [{"name": "Boston", "active": true}]}})
    );

    let (_, body) = post_query(&mut app, "{ location { name } }").await;
    assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test(sqlx::test(migrations = "../db/migrations/"))]
async fn test_get_graphql(pool: Pool<Sqlite>) {
    let mut app = test_app(pool, true);
    let request = Request::builder()
        .uri(format!(
            "{}?query=%7B%20locations%20%7B%20id%20%7D%20%7D",
            graphql::GRAPHQL_PATH
        ))
        .method("GET")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to collect body")
        .to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("response should be json");
    assert_eq!(body, json!({"data": {"locations": []}}));
}

#[test(sqlx::test(migrations = "../db/migrations/"))]
async fn test_playground(pool: Pool<Sqlite>) {
    let mut app = test_app(pool.clone(), true);
    let request = Request::builder()
        .uri(graphql::PLAYGROUND_PATH)
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers()[LOCATION], graphql::PLAYGROUND_PATH);

    // without the playground, the page is gone and the root points at the endpoint
    let mut app = test_app(pool, false);
    let request = Request::builder()
        .uri(graphql::PLAYGROUND_PATH)
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.headers()[LOCATION], graphql::GRAPHQL_PATH);
}

async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("failed to send message");
}

async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = ws
            .next()
            .await
            .expect("connection closed")
            .expect("failed to read message");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("message should be json");
        }
    }
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../db/fixtures", scripts("locations"))
))]
async fn test_graphql_websocket(pool: Pool<Sqlite>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local address");
    let app = test_app(pool, true);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let mut request = format!("ws://{addr}{}", graphql::GRAPHQL_WS_PATH)
        .into_client_request()
        .expect("failed to build request");
    request.headers_mut().insert(
        "sec-websocket-protocol",
        HeaderValue::from_static("graphql-transport-ws"),
    );
    let (mut ws, _) = connect_async(request).await.expect("failed to connect");

    send_json(&mut ws, json!({"type": "connection_init"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "connection_ack");

    for (id, query, data) in [
        (
            "1",
            "subscription { locations { name } }",
            json!({"locations": [{"name": "Austin"}, {"name": "Boston"}]}),
        ),
        (
            "2",
            r#"{ location(code: "BOS") { name active } }"#,
            json!({"location": [{"name": "Boston", "active": true}]}),
        ),
    ] {
        send_json(
            &mut ws,
            json!({"id": id, "type": "subscribe", "payload": {"query": query}}),
        )
        .await;
        let next = next_json(&mut ws).await;
        assert_eq!((&next["id"], &next["type"]), (&json!(id), &json!("next")));
        assert_eq!(next["payload"]["data"], data, "{next}");
        assert_eq!(
            next_json(&mut ws).await,
            json!({"id": id, "type": "complete"})
        );
    }
}
