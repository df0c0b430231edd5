//! End-to-end tests against a bound listener

use api::{create_router, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use storage::{EntryStore, StoreConfig};
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> EntryStore {
    let config = StoreConfig {
        database_path: dir.path().join("app.db"),
        ..Default::default()
    };
    let store = EntryStore::connect(&config).await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

async fn spawn_server(store: EntryStore) -> SocketAddr {
    let state = Arc::new(AppState::new(store).unwrap());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_entries_round_trip_over_http() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(open_store(&dir).await).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/entries", addr);

    let listed: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed, json!([]));

    let response = client
        .post(&url)
        .form(&[("content", "Buy milk")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created, json!({ "id": 1, "content": "Buy milk" }));

    let response = client.post(&url).form(&[("content", " ")]).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let listed: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed, json!([{ "id": 1, "content": "Buy milk" }]));
}

#[tokio::test]
async fn test_restart_keeps_entries() {
    let dir = TempDir::new().unwrap();

    let store = open_store(&dir).await;
    store.create_entry("Buy milk").await.unwrap();
    store.create_entry("Walk dog").await.unwrap();
    store.close().await;

    let addr = spawn_server(open_store(&dir).await).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/entries", addr);

    let listed: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(
        listed,
        json!([
            { "id": 2, "content": "Walk dog" },
            { "id": 1, "content": "Buy milk" }
        ])
    );

    let created: Value = client
        .post(&url)
        .form(&[("content", "Water plants")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["id"], 3);
}
