//! Blocking JSON client shared by the HTTP book sources.
//!
//! The [`BookSource`](booktrend_core::BookSource) trait is synchronous to keep
//! the ingestion loop embeddable in synchronous contexts. This client bridges
//! async `reqwest` calls to that interface by blocking on a Tokio runtime it
//! owns.

use std::time::Duration;

use booktrend_core::FetchError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "booktrend/0.1 (book metadata research)";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error raised when an HTTP source cannot be constructed.
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid base URL {url:?}")]
    BaseUrl {
        /// URL as configured.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

/// Transport settings shared by every HTTP source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Request timeout, applied to connect and to the whole request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpSettings {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Parse a configured base URL, dropping any trailing slash from its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, SourceBuildError> {
    let mut url = Url::parse(raw).map_err(|source| SourceBuildError::BaseUrl {
        url: raw.to_owned(),
        source,
    })?;
    let trimmed = url.path().trim_end_matches('/').to_owned();
    url.set_path(&trimmed);
    Ok(url)
}

/// Append `segment` to the path of `base`.
pub(crate) fn endpoint(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    let path = format!("{}/{segment}", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}

/// HTTP client that blocks on an owned runtime.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the client uses its own stored
/// runtime. When called from within a multi-threaded Tokio runtime it uses
/// that runtime's handle with [`tokio::task::block_in_place`]. Within a
/// `current_thread` runtime it falls back to its own runtime.
pub(crate) struct BlockingJsonClient {
    client: Client,
    runtime: Runtime,
    timeout: Duration,
}

impl std::fmt::Debug for BlockingJsonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingJsonClient")
            .field("client", &self.client)
            .field("timeout", &self.timeout)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl BlockingJsonClient {
    pub(crate) fn new(settings: &HttpSettings) -> Result<Self, SourceBuildError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            timeout: settings.timeout,
        })
    }

    /// Fetch `url` and decode the body as `T`.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let future = self.get_json_async(url);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    async fn get_json_async<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, url))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(err, url))?;

        serde_json::from_slice(&body).map_err(|err| FetchError::Parse {
            url: redact(url),
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: reqwest::Error, url: &Url) -> FetchError {
        let url = redact(url);
        let error = error.without_url();
        if error.is_timeout() {
            return FetchError::Timeout {
                url,
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Http {
                url,
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_builder() {
            return FetchError::Transport {
                url,
                message: error.to_string(),
            };
        }

        FetchError::Network {
            url,
            message: error.to_string(),
        }
    }
}

/// Render `url` for errors and logs with any API key masked.
pub(crate) fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                "***".to_owned()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
