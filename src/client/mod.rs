use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod cache;
pub mod links;

pub use cache::{RequestKey, RequestKind, ResponseCache};
pub use links::{repo_path, Endpoint};

use crate::config::ClientConfig;

pub const TOKEN_ENV_VAR: &str = "API_TOKEN";
pub const ACCEPT_HEADER: &str = "application/vnd.github.v3.star+json";

const MAX_PAGES: usize = 1000;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No API token found: set API_TOKEN or add it to the secrets file")]
    MissingToken,

    #[error("Invalid API root '{0}'")]
    InvalidRoot(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} is still being computed upstream (HTTP 202), try again shortly")]
    Pending { url: String },

    #[error("Request to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: expected {expected}")]
    UnexpectedShape { url: String, expected: &'static str },
}

/// Bearer token used for every API call.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Resolve the token from `API_TOKEN`, falling back to the secrets file.
    pub fn resolve(secrets_path: &Path) -> Result<Self, ClientError> {
        Self::resolve_from(std::env::var(TOKEN_ENV_VAR).ok(), secrets_path)
    }

    fn resolve_from(env_value: Option<String>, secrets_path: &Path) -> Result<Self, ClientError> {
        if let Some(token) = env_value.filter(|t| !t.trim().is_empty()) {
            debug!("Using API token from {}", TOKEN_ENV_VAR);
            return Ok(Self::new(token.trim()));
        }

        if secrets_path.is_file() {
            let secrets = config::Config::builder()
                .add_source(config::File::from(secrets_path).format(config::FileFormat::Toml))
                .build();

            match secrets {
                Ok(secrets) => {
                    if let Ok(token) = secrets.get_string(TOKEN_ENV_VAR) {
                        if !token.trim().is_empty() {
                            debug!("Using API token from {}", secrets_path.display());
                            return Ok(Self::new(token.trim()));
                        }
                    }
                }
                Err(e) => warn!("Could not read secrets file {}: {}", secrets_path.display(), e),
            }
        }

        Err(ClientError::MissingToken)
    }

    fn authorization(&self) -> String {
        format!("token {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Authenticated, paginating and memoizing client for the hosting REST API.
pub struct Client {
    http: reqwest::Client,
    root: String,
    owner: String,
    repo: String,
    headers: HeaderMap,
    cache: Arc<ResponseCache>,
}

impl Client {
    pub fn new(config: &ClientConfig, token: Token, cache: Arc<ResponseCache>) -> Result<Self, ClientError> {
        let root = links::normalize_root(&config.root)
            .ok_or_else(|| ClientError::InvalidRoot(config.root.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        let mut authorization = HeaderValue::from_str(&token.authorization())?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("openstats/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;

        info!("API client ready for {}/{} at {}", config.owner, config.repo, root);

        Ok(Self {
            http,
            root,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            headers,
            cache,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Path of an endpoint of the configured repository.
    pub fn path(&self, endpoint: Endpoint) -> String {
        repo_path(&self.owner, &self.repo, endpoint)
    }

    /// Fetch every page of a list endpoint and concatenate the items in link order.
    pub async fn fetch(&self, path: &str, options: &str) -> Result<Vec<Value>, ClientError> {
        let url = links::list_url(&self.root, path, options);
        let key = self.key(RequestKind::List, &url);

        match self.cache.get_or_fetch(key, || self.fetch_pages(&url)).await? {
            Value::Array(items) => Ok(items),
            _ => Err(ClientError::UnexpectedShape {
                url,
                expected: "a JSON array",
            }),
        }
    }

    /// Fetch a single-resource endpoint.
    pub async fn fetch_one(&self, path: &str, options: &str) -> Result<Value, ClientError> {
        let url = links::resource_url(&self.root, path, options);
        let key = self.key(RequestKind::Single, &url);

        self.cache
            .get_or_fetch(key, || async {
                let (value, _) = self.get_page(&url).await?;
                Ok(value)
            })
            .await
    }

    fn key(&self, kind: RequestKind, url: &str) -> RequestKey {
        // the token is fixed per client and stays out of the key
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(_, value)| !value.is_sensitive())
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        headers.sort();

        RequestKey {
            kind,
            url: url.to_string(),
            headers,
        }
    }

    async fn fetch_pages(&self, first: &str) -> Result<Value, ClientError> {
        let mut items = Vec::new();
        let mut next = Some(first.to_string());
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages == MAX_PAGES {
                warn!(
                    "Stopping pagination of {} after {} pages ({} items)",
                    first,
                    MAX_PAGES,
                    items.len()
                );
                break;
            }

            let (page, link) = self.get_page(&url).await?;
            match page {
                Value::Array(batch) => items.extend(batch),
                _ => {
                    return Err(ClientError::UnexpectedShape {
                        url,
                        expected: "a JSON array page",
                    })
                }
            }

            pages += 1;
            next = link;
        }

        debug!("Fetched {} items over {} pages from {}", items.len(), pages, first);
        Ok(Value::Array(items))
    }

    /// One GET: the decoded body plus the next-page link, if any.
    async fn get_page(&self, url: &str) -> Result<(Value, Option<String>), ClientError> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Err(ClientError::Pending {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(links::next_page_url);

        let value = response.json::<Value>().await.map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })?;

        Ok((value, next))
    }
}
