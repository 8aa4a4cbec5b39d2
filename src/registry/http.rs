// ABOUTME: Registry v2 HTTP client built on reqwest.
// ABOUTME: Pings /v2/, negotiates Basic or Bearer auth, and pages through tags/list.

use super::auth::{Challenge, next_link};
use super::error::{
    DecodeSnafu, NotFoundSnafu, RequestSnafu, Result, TokenSnafu, UnauthorizedSnafu,
    UnexpectedStatusSnafu,
};
use super::{Connector, RegistryError, TagLister};
use crate::types::Credentials;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header};
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on tags/list pages followed in one listing.
const MAX_TAG_PAGES: usize = 1000;

/// Hosts that serve official images under the implicit `library/` namespace.
const DOCKER_HUB_HOSTS: &[&str] = &[
    "registry.hub.docker.com",
    "docker.io",
    "index.docker.io",
    "registry-1.docker.io",
];

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// How requests to the registry are authorized after connecting.
#[derive(Debug, Clone)]
enum Auth {
    Anonymous,
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
    },
}

/// Connects to registries over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self> {
        Self::with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a connector whose individual HTTP requests give up after `timeout`.
    pub fn with_request_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("imagewait/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context(RequestSnafu {
                url: "client setup",
            })?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn basic_login(&self, ping: &Url, credentials: &Credentials) -> Result<()> {
        if credentials.is_anonymous() {
            return UnauthorizedSnafu { url: ping.as_str() }.fail();
        }

        let response = self
            .client
            .get(ping.clone())
            .basic_auth(
                credentials.username(),
                Some(credentials.password().expose()),
            )
            .send()
            .await
            .context(RequestSnafu { url: ping.as_str() })?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => UnauthorizedSnafu { url: ping.as_str() }.fail(),
            status => UnexpectedStatusSnafu {
                url: ping.as_str(),
                status: status.as_u16(),
            }
            .fail(),
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Client = HttpRegistry;

    async fn connect(&self, url: &str, credentials: &Credentials) -> Result<HttpRegistry> {
        let base = Url::parse(url).map_err(|e| RegistryError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if base.host_str().is_none() {
            return Err(RegistryError::InvalidUrl {
                url: url.to_string(),
                message: "missing host".to_string(),
            });
        }
        let ping = join(&base, "v2/")?;

        tracing::debug!("Pinging registry at {}", ping);
        let response = self
            .client
            .get(ping.clone())
            .send()
            .await
            .context(RequestSnafu { url: ping.as_str() })?;

        let auth = match response.status() {
            s if s.is_success() => Auth::Anonymous,
            StatusCode::UNAUTHORIZED => {
                let challenge = response
                    .headers()
                    .get(header::WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(Challenge::parse);

                match challenge {
                    Some(Challenge::Basic) => {
                        self.basic_login(&ping, credentials).await?;
                        Auth::Basic
                    }
                    Some(Challenge::Bearer { realm, service }) => {
                        // Validate credentials up front so a bad login fails fast.
                        if !credentials.is_anonymous() {
                            fetch_token(&self.client, &realm, service.as_deref(), None, credentials)
                                .await?;
                        }
                        Auth::Bearer { realm, service }
                    }
                    None => return UnauthorizedSnafu { url: ping.as_str() }.fail(),
                }
            }
            status => {
                return UnexpectedStatusSnafu {
                    url: ping.as_str(),
                    status: status.as_u16(),
                }
                .fail();
            }
        };

        tracing::debug!("Connected to {} using {:?} auth", base, auth);

        Ok(HttpRegistry {
            client: self.client.clone(),
            base,
            credentials: credentials.clone(),
            auth,
            tokens: Mutex::new(HashMap::new()),
        })
    }
}

/// An authenticated session with one registry.
pub struct HttpRegistry {
    client: Client,
    base: Url,
    credentials: Credentials,
    auth: Auth,
    tokens: Mutex<HashMap<String, String>>,
}

impl HttpRegistry {
    /// Repository path as the registry expects it in the URL.
    pub fn resolve_repository(&self, repository: &str) -> String {
        let on_docker_hub = self
            .base
            .host_str()
            .is_some_and(|host| DOCKER_HUB_HOSTS.contains(&host));

        if on_docker_hub && !repository.contains('/') {
            format!("library/{}", repository)
        } else {
            repository.to_string()
        }
    }

    async fn token_for(&self, repository: &str) -> Result<String> {
        let cached = self.tokens.lock().get(repository).cloned();
        if let Some(token) = cached {
            return Ok(token);
        }

        let Auth::Bearer { realm, service } = &self.auth else {
            return Ok(String::new());
        };

        let scope = format!("repository:{}:pull", repository);
        let token = fetch_token(
            &self.client,
            realm,
            service.as_deref(),
            Some(&scope),
            &self.credentials,
        )
        .await?;

        self.tokens
            .lock()
            .insert(repository.to_string(), token.clone());
        Ok(token)
    }

    async fn authorize(&self, request: RequestBuilder, repository: &str) -> Result<RequestBuilder> {
        Ok(match &self.auth {
            Auth::Anonymous => request,
            Auth::Basic => request.basic_auth(
                self.credentials.username(),
                Some(self.credentials.password().expose()),
            ),
            Auth::Bearer { .. } => request.bearer_auth(self.token_for(repository).await?),
        })
    }

    /// Resolve a `Link` target. It must stay on the registry origin and must not
    /// revisit a page.
    fn next_page(&self, current: &Url, target: &str, visited: &mut HashSet<Url>) -> Result<Url> {
        let next = join(current, target)?;

        if next.origin() != self.base.origin() {
            return DecodeSnafu {
                url: next.as_str(),
                message: "pagination link points outside the registry",
            }
            .fail();
        }
        if visited.len() >= MAX_TAG_PAGES || !visited.insert(next.clone()) {
            return DecodeSnafu {
                url: next.as_str(),
                message: "pagination does not terminate",
            }
            .fail();
        }

        Ok(next)
    }

    /// GET `url`, refreshing a cached bearer token once if it was rejected.
    async fn get(&self, url: &Url, repository: &str) -> Result<Response> {
        let mut refreshed = false;

        loop {
            let request = self.authorize(self.client.get(url.clone()), repository).await?;
            let response = request
                .send()
                .await
                .context(RequestSnafu { url: url.as_str() })?;

            match response.status() {
                s if s.is_success() => return Ok(response),
                StatusCode::UNAUTHORIZED
                    if !refreshed && matches!(self.auth, Auth::Bearer { .. }) =>
                {
                    tracing::debug!("Token for {} rejected, fetching a new one", repository);
                    self.tokens.lock().remove(repository);
                    refreshed = true;
                }
                StatusCode::UNAUTHORIZED => return UnauthorizedSnafu { url: url.as_str() }.fail(),
                StatusCode::NOT_FOUND => return NotFoundSnafu { url: url.as_str() }.fail(),
                status => {
                    return UnexpectedStatusSnafu {
                        url: url.as_str(),
                        status: status.as_u16(),
                    }
                    .fail();
                }
            }
        }
    }
}

#[async_trait]
impl TagLister for HttpRegistry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let repository = self.resolve_repository(repository);
        let mut url = join(&self.base, &format!("v2/{}/tags/list", repository))?;
        let mut tags = Vec::new();
        let mut visited = HashSet::from([url.clone()]);

        loop {
            let response = self.get(&url, &repository).await?;
            let next = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let page: TagList = response.json().await.map_err(|e| RegistryError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            tags.extend(page.tags.unwrap_or_default());

            match next {
                Some(target) => url = self.next_page(&url, &target, &mut visited)?,
                None => break,
            }
        }

        tracing::debug!("Registry lists {} tag(s) for {}", tags.len(), repository);
        Ok(tags)
    }
}

async fn fetch_token(
    client: &Client,
    realm: &str,
    service: Option<&str>,
    scope: Option<&str>,
    credentials: &Credentials,
) -> Result<String> {
    let mut query = Vec::new();
    if let Some(service) = service {
        query.push(("service", service));
    }
    if let Some(scope) = scope {
        query.push(("scope", scope));
    }

    let mut request = client.get(realm).query(&query);
    if !credentials.is_anonymous() {
        request = request.basic_auth(
            credentials.username(),
            Some(credentials.password().expose()),
        );
    }

    let response = request.send().await.context(RequestSnafu { url: realm })?;

    match response.status() {
        s if s.is_success() => {
            let body: TokenResponse = response.json().await.map_err(|e| RegistryError::Decode {
                url: realm.to_string(),
                message: e.to_string(),
            })?;
            body.token.or(body.access_token).ok_or_else(|| {
                TokenSnafu {
                    realm,
                    message: "response carried no token",
                }
                .build()
            })
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            UnauthorizedSnafu { url: realm }.fail()
        }
        status => TokenSnafu {
            realm,
            message: format!("status {}", status.as_u16()),
        }
        .fail(),
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| RegistryError::InvalidUrl {
        url: format!("{}{}", base, path),
        message: e.to_string(),
    })
}
