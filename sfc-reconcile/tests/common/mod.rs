//! Shared test utilities for sfc-reconcile integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use sfc_reconcile::{CloudConfig, MemoryStore, NeutronStore, Object, ObjectKind, SfcReconciler};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-token";

const SFC_COLLECTIONS: [&str; 4] = [
    "flow_classifiers",
    "port_pairs",
    "port_pair_groups",
    "port_chains",
];

/// Reconciler over a fresh in-memory store.
pub fn memory_reconciler() -> (Arc<MemoryStore>, SfcReconciler) {
    let store = Arc::new(MemoryStore::new());
    let reconciler = SfcReconciler::new(store.clone());
    (store, reconciler)
}

/// Seed one named object and return its ID.
pub fn seed(store: &MemoryStore, kind: ObjectKind, name: &str) -> String {
    store.insert(kind, json!({ "name": name }))
}

/// Seed ports named `names`, returning their IDs in the same order.
pub fn seed_ports(store: &MemoryStore, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| seed(store, ObjectKind::Port, name))
        .collect()
}

pub fn object(value: Value) -> Object {
    value.as_object().cloned().expect("test value must be an object")
}

#[derive(Default)]
struct MockState {
    collections: HashMap<String, Vec<Object>>,
    requests: Vec<String>,
    tokens: Vec<Option<String>>,
}

impl MockState {
    fn record(&mut self, method: &str, path: String, headers: &HeaderMap) {
        self.requests.push(format!("{method} {path}"));
        self.tokens.push(
            headers
                .get("x-auth-token")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
    }
}

type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock Neutron server with the ports and networking-sfc collections.
pub struct MockNeutron {
    pub addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockNeutron {
    /// Spawn the server on an OS-assigned port.
    pub async fn spawn() -> Self {
        let state = SharedState::default();
        let router = Router::new()
            .route("/v2.0/ports", get(list_ports))
            .route("/v2.0/sfc/{collection}", get(list_sfc).post(create_sfc))
            .route(
                "/v2.0/sfc/{collection}/{id}",
                axum::routing::put(update_sfc).delete(delete_sfc),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Neutron store pointed at this server, authenticating with [`TEST_TOKEN`].
    pub fn store(&self) -> NeutronStore {
        let config = CloudConfig::new(Some(&self.endpoint()), Some(TEST_TOKEN.to_string()), 5)
            .expect("valid config");
        NeutronStore::new(&config).expect("Failed to build store")
    }

    /// Seed an object into a collection (e.g. `ports`); returns its ID.
    pub fn seed(&self, collection: &str, value: Value) -> String {
        let mut object = object(value);
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                object.insert("id".to_string(), json!(id));
                id
            }
        };
        lock(&self.state)
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(object);
        id
    }

    pub fn objects(&self, collection: &str) -> Vec<Object> {
        lock(&self.state)
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Requests received so far as `METHOD /path`.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests that were not GETs.
    pub fn mutation_count(&self) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| !r.starts_with("GET "))
            .count()
    }

    /// `X-Auth-Token` of every request received so far.
    pub fn tokens(&self) -> Vec<Option<String>> {
        lock(&self.state).tokens.clone()
    }
}

impl Drop for MockNeutron {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn neutron_error(status: StatusCode, error_type: &str, message: String) -> Response {
    let body = json!({
        "NeutronError": {"type": error_type, "message": message, "detail": ""}
    });
    (status, Json(body)).into_response()
}

fn singular(collection: &str) -> Option<&str> {
    SFC_COLLECTIONS
        .contains(&collection)
        .then(|| collection.trim_end_matches('s'))
}

fn wrap(key: &str, value: Value) -> Json<Value> {
    let mut body = Object::new();
    body.insert(key.to_string(), value);
    Json(Value::Object(body))
}

fn list(
    state: &SharedState,
    collection: &str,
    filters: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Response {
    let mut state = lock(state);
    state.record("GET", format!("/{collection}"), headers);

    let items: Vec<Value> = state
        .collections
        .get(collection)
        .into_iter()
        .flatten()
        .filter(|o| {
            filters
                .iter()
                .all(|(k, v)| o.get(k).and_then(Value::as_str) == Some(v.as_str()))
        })
        .cloned()
        .map(Value::Object)
        .collect();
    wrap(collection, Value::Array(items)).into_response()
}

async fn list_ports(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    list(&state, "ports", &filters, &headers)
}

async fn list_sfc(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    if singular(&collection).is_none() {
        return neutron_error(
            StatusCode::NOT_FOUND,
            "HTTPNotFound",
            format!("The resource could not be found: {collection}"),
        );
    }
    list(&state, &collection, &filters, &headers)
}

async fn create_sfc(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(key) = singular(&collection) else {
        return neutron_error(
            StatusCode::NOT_FOUND,
            "HTTPNotFound",
            format!("The resource could not be found: {collection}"),
        );
    };
    let mut state = lock(&state);
    state.record("POST", format!("/{collection}"), &headers);

    let Some(Value::Object(mut object)) = body.get(key).cloned() else {
        return neutron_error(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            format!("Resource body required: '{key}'"),
        );
    };
    object
        .entry("name")
        .or_insert_with(|| Value::String(String::new()));
    object.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
    state
        .collections
        .entry(collection.clone())
        .or_default()
        .push(object.clone());

    (StatusCode::CREATED, wrap(key, Value::Object(object))).into_response()
}

async fn update_sfc(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(key) = singular(&collection) else {
        return neutron_error(
            StatusCode::NOT_FOUND,
            "HTTPNotFound",
            format!("The resource could not be found: {collection}"),
        );
    };
    let mut state = lock(&state);
    state.record("PUT", format!("/{collection}/{id}"), &headers);

    let Some(Value::Object(fields)) = body.get(key).cloned() else {
        return neutron_error(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            format!("Resource body required: '{key}'"),
        );
    };
    if collection == "port_pairs" {
        for attr in ["ingress", "egress"] {
            if fields.contains_key(attr) {
                return neutron_error(
                    StatusCode::BAD_REQUEST,
                    "HTTPBadRequest",
                    format!("Attribute '{attr}' cannot be updated"),
                );
            }
        }
    }

    let found = state
        .collections
        .get_mut(&collection)
        .and_then(|objects| {
            objects
                .iter_mut()
                .find(|o| o.get("id").and_then(Value::as_str) == Some(id.as_str()))
        });
    match found {
        Some(object) => {
            object.extend(fields);
            wrap(key, Value::Object(object.clone())).into_response()
        }
        None => neutron_error(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("{key} {id} could not be found"),
        ),
    }
}

async fn delete_sfc(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let Some(key) = singular(&collection) else {
        return neutron_error(
            StatusCode::NOT_FOUND,
            "HTTPNotFound",
            format!("The resource could not be found: {collection}"),
        );
    };
    let mut state = lock(&state);
    state.record("DELETE", format!("/{collection}/{id}"), &headers);

    let objects = state.collections.entry(collection.clone()).or_default();
    let before = objects.len();
    objects.retain(|o| o.get("id").and_then(Value::as_str) != Some(id.as_str()));
    if objects.len() == before {
        return neutron_error(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("{key} {id} could not be found"),
        );
    }
    StatusCode::NO_CONTENT.into_response()
}
