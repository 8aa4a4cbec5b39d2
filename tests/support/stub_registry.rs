// ABOUTME: Minimal registry v2 HTTP stub for integration tests.
// ABOUTME: Serves /v2/, a token endpoint, and paginated tags/list with failure injection.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::net::TcpListener;

pub const USERNAME: &str = "ci";
pub const PASSWORD: &str = "secret";
/// base64("ci:secret")
const BASIC_HEADER: &str = "Basic Y2k6c2VjcmV0";

/// How the stub wants clients to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Open,
    Basic,
    /// Token endpoint accepts anonymous callers and `ci:secret`.
    Bearer,
}

struct StubState {
    auth: AuthMode,
    addr: SocketAddr,
    tags: Mutex<HashMap<String, Vec<String>>>,
    page_size: Option<usize>,
    fail_next: AtomicU32,
    reject_next: AtomicU32,
    next_link: Mutex<Option<String>>,
    tag_requests: AtomicU32,
    token_requests: AtomicU32,
}

type Shared = Arc<StubState>;

pub struct StubRegistry {
    state: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

impl StubRegistry {
    pub async fn start(auth: AuthMode) -> Self {
        Self::start_with_page_size(auth, None).await
    }

    pub async fn start_with_page_size(auth: AuthMode, page_size: Option<usize>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(StubState {
            auth,
            addr,
            tags: Mutex::new(HashMap::new()),
            page_size,
            fail_next: AtomicU32::new(0),
            reject_next: AtomicU32::new(0),
            next_link: Mutex::new(None),
            tag_requests: AtomicU32::new(0),
            token_requests: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/v2/", get(ping))
            .route("/v2/{*rest}", get(tags_list))
            .route("/token", get(token))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            state,
            _handle: handle,
        }
    }

    /// `host:port`, as passed in a registry field.
    pub fn host(&self) -> String {
        self.state.addr.to_string()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.state.addr)
    }

    pub fn push_tag(&self, repository: &str, tag: &str) {
        self.state
            .tags
            .lock()
            .entry(repository.to_string())
            .or_default()
            .push(tag.to_string());
    }

    /// The next `n` tag requests answer 503.
    pub fn fail_next(&self, n: u32) {
        self.state.fail_next.store(n, Ordering::SeqCst);
    }

    /// The next `n` tag requests are answered with an auth challenge,
    /// whatever credentials they carry.
    pub fn reject_next(&self, n: u32) {
        self.state.reject_next.store(n, Ordering::SeqCst);
    }

    /// Every tags/list page advertises `link` as its next page.
    pub fn set_next_link(&self, link: impl Into<String>) {
        *self.state.next_link.lock() = Some(link.into());
    }

    pub fn tag_requests(&self) -> u32 {
        self.state.tag_requests.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> u32 {
        self.state.token_requests.load(Ordering::SeqCst)
    }
}

fn challenge(state: &StubState) -> Response {
    let value = match state.auth {
        AuthMode::Open => return StatusCode::UNAUTHORIZED.into_response(),
        AuthMode::Basic => r#"Basic realm="stub""#.to_string(),
        AuthMode::Bearer => format!(
            r#"Bearer realm="http://{}/token",service="stub-registry""#,
            state.addr
        ),
    };
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_str(&value).unwrap(),
    );
    response
}

fn authorized(state: &StubState, headers: &HeaderMap) -> bool {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    match state.auth {
        AuthMode::Open => true,
        AuthMode::Basic => value == Some(BASIC_HEADER),
        AuthMode::Bearer => value.is_some_and(|v| v.starts_with("Bearer tok-")),
    }
}

async fn ping(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if authorized(&state, &headers) {
        Json(json!({})).into_response()
    } else {
        challenge(&state)
    }
}

async fn token(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        None => {}
        Some(BASIC_HEADER) => {}
        Some(_) => return StatusCode::UNAUTHORIZED.into_response(),
    }

    let scope = params.get("scope").cloned().unwrap_or_default();
    Json(json!({ "token": format!("tok-{}", scope) })).into_response()
}

async fn tags_list(
    State(state): State<Shared>,
    Path(rest): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let Some(repository) = rest.trim_start_matches('/').strip_suffix("/tags/list") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    state.tag_requests.fetch_add(1, Ordering::SeqCst);

    let rejecting = state
        .reject_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if rejecting || !authorized(&state, &headers) {
        return challenge(&state);
    }

    let failing = state
        .fail_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let Some(all) = state.tags.lock().get(repository).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "errors": [{ "code": "NAME_UNKNOWN" }] })),
        )
            .into_response();
    };

    let start = params
        .get("last")
        .and_then(|last| all.iter().position(|t| t == last))
        .map_or(0, |i| i + 1);

    let (page, more) = match state.page_size {
        Some(size) => {
            let end = (start + size).min(all.len());
            (all[start..end].to_vec(), end < all.len())
        }
        None => (all[start..].to_vec(), false),
    };

    let mut response = Json(json!({ "name": repository, "tags": page })).into_response();
    if let Some(link) = state.next_link.lock().clone() {
        let link = format!(r#"<{}>; rel="next""#, link);
        response
            .headers_mut()
            .insert(header::LINK, HeaderValue::from_str(&link).unwrap());
    } else if more {
        if let Some(last) = page.last() {
            let link = format!(
                r#"</v2/{}/tags/list?last={}&n={}>; rel="next""#,
                repository,
                last,
                state.page_size.unwrap_or_default()
            );
            response
                .headers_mut()
                .insert(header::LINK, HeaderValue::from_str(&link).unwrap());
        }
    }
    response
}
