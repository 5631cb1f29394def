#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use dealership_api::{
    auth::{mint_token, TokenVerifier},
    build_router,
    repository::MemoryCarStore,
    service::CarService,
    AppState,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

pub fn token(user_id: i64) -> String {
    mint_token(SECRET, user_id, 3600).expect("token")
}

pub fn test_app() -> (Router, MemoryCarStore) {
    let store = MemoryCarStore::new();
    let state = AppState {
        cars: CarService::new(Arc::new(store.clone())),
        tokens: TokenVerifier::new(SECRET),
    };
    (build_router(state), store)
}

pub fn car_body(brand: &str, model: &str, plates: &str) -> Value {
    json!({
        "brand": brand,
        "model": model,
        "color": "VERMELHO",
        "year_manufacture": 2020,
        "imported": false,
        "plates": plates,
        "selling_date": "2022-11-05",
        "selling_price": 55000
    })
}

/// Sends one request through the router and returns status and JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub async fn create_test_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    let mut retries = 0;
    while retries < 10 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        retries += 1;
    }

    addr
}
