//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use crud_dispatch::blog;
use crud_dispatch::config::{AppConfig, ResolutionMode};
use crud_dispatch::lifecycle::{Application, ApplicationBuilder, Shutdown};
use crud_dispatch::persistence::{EntityId, InMemoryStore, Persistence, PersistenceResult, Record};
use crud_dispatch::HttpServer;

/// In-memory store that counts and records calls.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: InMemoryStore,
    pub finds: AtomicUsize,
    pub queries: AtomicUsize,
    pub saves: AtomicUsize,
    pub deleted: Mutex<Vec<Record>>,
}

impl CountingStore {
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<Record> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Persistence for CountingStore {
    async fn find_by_id(&self, entity: &str, id: &EntityId) -> PersistenceResult<Option<Record>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(entity, id).await
    }

    async fn query_by_foreign_key(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> PersistenceResult<Vec<Record>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_by_foreign_key(entity, field, value).await
    }

    async fn list(&self, entity: &str) -> PersistenceResult<Vec<Record>> {
        self.inner.list(entity).await
    }

    async fn save(&self, record: Record) -> PersistenceResult<Record> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(record).await
    }

    async fn delete(&self, record: &Record) -> PersistenceResult<()> {
        self.deleted.lock().unwrap().push(record.clone());
        self.inner.delete(record).await
    }
}

/// Articles 3 and 7, with two comments on 7.
pub fn seeded_store() -> Arc<CountingStore> {
    let store = CountingStore::default();
    store.inner.insert(
        Record::new(blog::ARTICLE)
            .with_id(3_i64)
            .set("title", "Third article")
            .set("content", "three"),
    )
    .unwrap();
    store.inner.insert(
        Record::new(blog::ARTICLE)
            .with_id(7_i64)
            .set("title", "Seventh article")
            .set("content", "seven"),
    )
    .unwrap();
    store
        .inner
        .insert(Record::new(blog::COMMENT).set("article", 7).set("body", "First!"))
        .unwrap();
    store
        .inner
        .insert(Record::new(blog::COMMENT).set("article", 7).set("body", "Nice post"))
        .unwrap();
    Arc::new(store)
}

pub fn blog_app(store: Arc<CountingStore>, mode: ResolutionMode) -> Application {
    let builder = ApplicationBuilder::new().store(store).resolution(mode);
    blog::install(builder).build().unwrap()
}

pub fn blog_router(store: Arc<CountingStore>) -> Router {
    HttpServer::new(blog_app(store, ResolutionMode::Sequential), &AppConfig::default()).router()
}

/// Send one request through the router in-process.
pub async fn send(router: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Send a request with an arbitrary, possibly non-JSON, body.
pub async fn send_raw(router: &Router, method: Method, path: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Serve an application on an ephemeral port.
pub async fn start_server(app: Application) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app, &AppConfig::default());
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        server.run(listener, signalled).await.unwrap();
    });
    (addr, shutdown)
}
