//! HTTP-backed Google Books source.

use booktrend_core::{
    AuthorPolicy, BookDraft, BookSource, FetchError, GenreMatcher, GenreName, PageRequest,
    RawBook, RecordRejection, SourceApi, SourcePage,
};
use log::debug;
use url::Url;

use crate::http::{
    BlockingJsonClient, HttpSettings, SourceBuildError, endpoint, parse_base_url, redact,
};

use super::response::VolumesResponse;

/// Default Google Books API base URL.
pub const DEFAULT_GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1";

/// Largest page the volumes endpoint serves (`maxResults`).
pub const GOOGLE_BOOKS_PAGE_CEILING: usize = 40;

/// Configuration for [`GoogleBooksSource`].
#[derive(Clone, PartialEq, Eq)]
pub struct GoogleBooksConfig {
    /// Base URL of the Books API.
    pub base_url: String,
    /// Static API key; anonymous quota is used when absent.
    pub api_key: Option<String>,
    /// Transport settings.
    pub http: HttpSettings,
}

impl std::fmt::Debug for GoogleBooksConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBooksConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("http", &self.http)
            .finish()
    }
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GOOGLE_BOOKS_URL.to_owned(),
            api_key: None,
            http: HttpSettings::default(),
        }
    }
}

impl GoogleBooksConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key. Blank keys are treated as absent.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    /// Set the transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }
}

/// Google Books volume search as a [`BookSource`].
#[derive(Debug)]
pub struct GoogleBooksSource {
    base_url: Url,
    api_key: Option<String>,
    client: BlockingJsonClient,
}

impl GoogleBooksSource {
    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: GoogleBooksConfig) -> Result<Self, SourceBuildError> {
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            api_key: config.api_key,
            client: BlockingJsonClient::new(&config.http)?,
        })
    }

    /// Build the volumes URL for `genre` and `request`.
    fn volumes_url(&self, genre: &GenreName, request: PageRequest) -> Url {
        let mut url = endpoint(&self.base_url, "volumes");
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &format!("subject:{}", genre.as_str()))
                .append_pair("startIndex", &request.offset.to_string())
                .append_pair("maxResults", &request.limit.to_string());
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

impl BookSource for GoogleBooksSource {
    type Record = RawBook;

    fn source_api(&self) -> SourceApi {
        SourceApi::GoogleBooks
    }

    fn page_size_ceiling(&self) -> usize {
        GOOGLE_BOOKS_PAGE_CEILING
    }

    fn author_policy(&self) -> AuthorPolicy {
        AuthorPolicy::Required
    }

    fn fetch_page(
        &self,
        genre: &GenreName,
        request: PageRequest,
    ) -> Result<SourcePage<RawBook>, FetchError> {
        let url = self.volumes_url(genre, request);
        debug!("fetching Google Books page {}: {}", request.page, redact(&url));
        let response: VolumesResponse = self.client.get_json(&url)?;
        Ok(response.into_page())
    }

    fn normalize_record(
        &self,
        record: RawBook,
        matcher: &GenreMatcher,
    ) -> Result<BookDraft, RecordRejection> {
        record.normalize(self.source_api(), self.author_policy(), matcher)
    }
}
