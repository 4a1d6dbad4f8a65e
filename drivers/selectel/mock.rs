//! In-process Selectel stand-in for tests / 测试用的进程内Selectel模拟端
//!
//! Implements just enough of the REST surface: token handshake, container
//! CRUD, JSON listings, object PUT/GET/DELETE/COPY and archive extraction.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;

use super::types::{ContainerEntry, FileEntry};

pub const LOGIN: &str = "acc_123";
pub const PASSWORD: &str = "p@ss";

const LAST_MODIFIED: &str = "2026-08-05T00:00:00.000000";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub meta: BTreeMap<String, String>,
}

pub struct MockState {
    addr: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    containers: Mutex<BTreeMap<String, String>>,
    tokens: Mutex<HashSet<String>>,
    auth_calls: AtomicUsize,
    fail_delete: AtomicBool,
    expire_secs: AtomicUsize,
    last_archive: Mutex<Option<(String, usize)>>,
}

impl MockState {
    fn new(addr: String) -> Self {
        let mut containers = BTreeMap::new();
        containers.insert("files".to_string(), "private".to_string());
        Self {
            addr,
            objects: Mutex::new(BTreeMap::new()),
            containers: Mutex::new(containers),
            tokens: Mutex::new(HashSet::new()),
            auth_calls: AtomicUsize::new(0),
            fail_delete: AtomicBool::new(false),
            expire_secs: AtomicUsize::new(600),
            last_archive: Mutex::new(None),
        }
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn set_expire_secs(&self, secs: usize) {
        self.expire_secs.store(secs, Ordering::SeqCst);
    }

    pub fn last_archive(&self) -> Option<(String, usize)> {
        self.last_archive.lock().unwrap().clone()
    }

    fn authed(&self, headers: &HeaderMap) -> bool {
        headers
            .get("x-auth-token")
            .and_then(|v| v.to_str().ok())
            .map(|t| !t.is_empty() && self.tokens.lock().unwrap().contains(t))
            .unwrap_or(false)
    }
}

/// Bind an ephemeral port and serve the mock; returns state, address and
/// auth endpoint URL.
pub async fn spawn() -> (Arc<MockState>, String, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let state = Arc::new(MockState::new(addr.clone()));

    let app = Router::new()
        .route("/", get(auth_handler))
        .route("/v1/acc", any(account_handler))
        .route("/v1/acc/:container", any(container_handler))
        .route("/v1/acc/:container/*key", any(object_handler))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let auth_url = format!("http://{}/", addr);
    (state, addr, auth_url)
}

fn with_headers(status: StatusCode, pairs: Vec<(&'static str, String)>) -> Response {
    let mut resp = status.into_response();
    for (name, value) in pairs {
        resp.headers_mut()
            .insert(name, HeaderValue::from_str(&value).unwrap());
    }
    resp
}

async fn auth_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let user = headers.get("x-auth-user").and_then(|v| v.to_str().ok()).unwrap_or("");
    let key = headers.get("x-auth-key").and_then(|v| v.to_str().ok()).unwrap_or("");
    if user != LOGIN || key != PASSWORD {
        return StatusCode::FORBIDDEN.into_response();
    }

    let n = state.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("tok-{}", n);
    state.tokens.lock().unwrap().insert(token.clone());

    with_headers(
        StatusCode::NO_CONTENT,
        vec![
            // Trailing slash on purpose, like the real endpoint
            ("x-storage-url", format!("http://{}/v1/acc/", state.addr)),
            ("x-auth-token", token),
            ("x-expire-auth-token", state.expire_secs.load(Ordering::SeqCst).to_string()),
        ],
    )
}

async fn account_handler(
    State(state): State<Arc<MockState>>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    if !state.authed(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let objects = state.objects.lock().unwrap().clone();
    let containers = state.containers.lock().unwrap().clone();

    match method.as_str() {
        "HEAD" => {
            let bytes_used: usize = objects.values().map(|o| o.data.len()).sum();
            with_headers(
                StatusCode::NO_CONTENT,
                vec![
                    ("x-account-container-count", containers.len().to_string()),
                    ("x-account-object-count", objects.len().to_string()),
                    ("x-account-bytes-used", bytes_used.to_string()),
                    ("x-transfered-bytes", "0".to_string()),
                ],
            )
        }
        "GET" => {
            let entries: Vec<ContainerEntry> = containers
                .iter()
                .map(|(name, ctype)| {
                    let prefix = format!("{}/", name);
                    let members: Vec<&StoredObject> = objects
                        .iter()
                        .filter(|(k, _)| k.starts_with(&prefix))
                        .map(|(_, v)| v)
                        .collect();
                    ContainerEntry {
                        name: name.clone(),
                        count: members.len() as u64,
                        bytes: members.iter().map(|o| o.data.len() as u64).sum(),
                        container_type: ctype.clone(),
                    }
                })
                .collect();

            if params.get("format").map(String::as_str) == Some("json") {
                (
                    StatusCode::OK,
                    [("content-type", "application/json")],
                    serde_json::to_string(&entries).unwrap(),
                )
                    .into_response()
            } else {
                let names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
                (StatusCode::OK, names.join("\n")).into_response()
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn container_handler(
    State(state): State<Arc<MockState>>,
    Path(container): Path<String>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Response {
    if !state.authed(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match method.as_str() {
        "PUT" => {
            if let Some(format) = params.get("extract-archive") {
                *state.last_archive.lock().unwrap() = Some((format.clone(), body.len()));
                state
                    .containers
                    .lock()
                    .unwrap()
                    .entry(container)
                    .or_insert_with(|| "private".to_string());
                return (
                    StatusCode::CREATED,
                    [("content-type", "application/json")],
                    r#"{"Number Files Created": 1}"#.to_string(),
                )
                    .into_response();
            }

            let ctype = headers
                .get("x-container-meta-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("public")
                .to_string();
            let mut containers = state.containers.lock().unwrap();
            if containers.contains_key(&container) {
                containers.insert(container, ctype);
                StatusCode::ACCEPTED.into_response()
            } else {
                containers.insert(container, ctype);
                StatusCode::CREATED.into_response()
            }
        }
        "HEAD" => {
            let containers = state.containers.lock().unwrap();
            match containers.get(&container) {
                Some(ctype) => with_headers(
                    StatusCode::NO_CONTENT,
                    vec![("x-container-meta-type", ctype.clone())],
                ),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        "POST" => {
            let ctype = headers
                .get("x-container-meta-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("public")
                .to_string();
            let mut containers = state.containers.lock().unwrap();
            if containers.contains_key(&container) {
                containers.insert(container, ctype);
                StatusCode::ACCEPTED.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        "DELETE" => {
            let mut containers = state.containers.lock().unwrap();
            if !containers.contains_key(&container) {
                return StatusCode::NOT_FOUND.into_response();
            }
            let prefix = format!("{}/", container);
            let not_empty = state
                .objects
                .lock()
                .unwrap()
                .keys()
                .any(|k| k.starts_with(&prefix));
            if not_empty {
                return StatusCode::CONFLICT.into_response();
            }
            containers.remove(&container);
            StatusCode::NO_CONTENT.into_response()
        }
        "GET" => {
            if !state.containers.lock().unwrap().contains_key(&container) {
                return StatusCode::NOT_FOUND.into_response();
            }
            let prefix = format!("{}/", container);
            let objects = state.objects.lock().unwrap();
            let mut entries: Vec<FileEntry> = objects
                .iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .map(|(k, o)| FileEntry {
                    name: k[prefix.len()..].to_string(),
                    bytes: o.data.len() as u64,
                    hash: String::new(),
                    content_type: o.content_type.clone(),
                    last_modified: LAST_MODIFIED.to_string(),
                })
                .collect();

            if let Some(want) = params.get("prefix") {
                entries.retain(|e| e.name.starts_with(want.as_str()));
            }
            if let Some(marker) = params.get("marker") {
                entries.retain(|e| e.name.as_str() > marker.as_str());
            }
            if let Some(limit) = params.get("limit").and_then(|v| v.parse::<usize>().ok()) {
                entries.truncate(limit);
            }

            if params.get("format").map(String::as_str) == Some("json") {
                (
                    StatusCode::OK,
                    [("content-type", "application/json")],
                    serde_json::to_string(&entries).unwrap(),
                )
                    .into_response()
            } else {
                let names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
                (StatusCode::OK, names.join("\n")).into_response()
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn object_handler(
    State(state): State<Arc<MockState>>,
    Path((container, key)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.authed(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let full_key = format!("{}/{}", container, key);

    match method.as_str() {
        "PUT" => {
            let mut meta = BTreeMap::new();
            for (name, value) in headers.iter() {
                if let Ok(v) = value.to_str() {
                    meta.insert(name.as_str().to_ascii_lowercase(), v.to_string());
                }
            }
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/octet-stream")
                .to_string();

            state
                .containers
                .lock()
                .unwrap()
                .entry(container)
                .or_insert_with(|| "private".to_string());
            state.objects.lock().unwrap().insert(
                full_key,
                StoredObject { data: body.to_vec(), content_type, meta },
            );
            StatusCode::CREATED.into_response()
        }
        "GET" => match state.objects.lock().unwrap().get(&full_key) {
            Some(obj) => (
                StatusCode::OK,
                [("content-type", obj.content_type.clone())],
                obj.data.clone(),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "DELETE" => {
            if state.fail_delete.load(Ordering::SeqCst) {
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            match state.objects.lock().unwrap().remove(&full_key) {
                Some(_) => StatusCode::NO_CONTENT.into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        "COPY" => {
            let destination = headers
                .get("destination")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .trim_start_matches('/')
                .to_string();
            if destination.is_empty() {
                return StatusCode::PRECONDITION_FAILED.into_response();
            }
            let mut objects = state.objects.lock().unwrap();
            match objects.get(&full_key).cloned() {
                Some(obj) => {
                    objects.insert(destination, obj);
                    StatusCode::CREATED.into_response()
                }
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
