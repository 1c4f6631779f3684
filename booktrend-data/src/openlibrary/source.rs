//! HTTP-backed Open Library source.

use booktrend_core::{
    AuthorPolicy, BookDraft, BookSource, FetchError, GenreMatcher, GenreName, PageRequest,
    RawBook, RecordRejection, SourceApi, SourcePage,
};
use log::debug;
use url::Url;

use crate::http::{BlockingJsonClient, HttpSettings, SourceBuildError, endpoint, parse_base_url};

use super::response::SearchResponse;

/// Default Open Library base URL.
pub const DEFAULT_OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

/// Largest page requested from Open Library in one call.
pub const OPEN_LIBRARY_PAGE_CEILING: usize = 25;

/// Configuration for [`OpenLibrarySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLibraryConfig {
    /// Base URL of the Open Library service.
    pub base_url: String,
    /// Transport settings.
    pub http: HttpSettings,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPEN_LIBRARY_URL.to_owned(),
            http: HttpSettings::default(),
        }
    }
}

impl OpenLibraryConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }
}

/// Open Library subject search as a [`BookSource`].
///
/// # Example
///
/// ```no_run
/// use booktrend_core::{GenreName, IngestSettings, SqliteBookStore, ingest};
/// use booktrend_data::openlibrary::{OpenLibraryConfig, OpenLibrarySource};
///
/// let source = OpenLibrarySource::with_config(OpenLibraryConfig::default())?;
/// let mut store = SqliteBookStore::open("book_trends.db")?;
/// let genre = GenreName::new("Mystery")?;
/// let report = ingest(&source, &mut store, &genre, 50, &IngestSettings::default())?;
/// println!("inserted {} books", report.inserted);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct OpenLibrarySource {
    base_url: Url,
    client: BlockingJsonClient,
}

impl OpenLibrarySource {
    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: OpenLibraryConfig) -> Result<Self, SourceBuildError> {
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            client: BlockingJsonClient::new(&config.http)?,
        })
    }

    /// Build the search URL for `genre` and `request`.
    fn search_url(&self, genre: &GenreName, request: PageRequest) -> Url {
        let mut url = endpoint(&self.base_url, "search.json");
        url.query_pairs_mut()
            .append_pair("subject", genre.as_str())
            .append_pair("limit", &request.limit.to_string())
            .append_pair("offset", &request.offset.to_string())
            .append_pair("format", "json");
        url
    }
}

impl BookSource for OpenLibrarySource {
    type Record = RawBook;

    fn source_api(&self) -> SourceApi {
        SourceApi::OpenLibrary
    }

    fn page_size_ceiling(&self) -> usize {
        OPEN_LIBRARY_PAGE_CEILING
    }

    fn author_policy(&self) -> AuthorPolicy {
        AuthorPolicy::Optional
    }

    fn fetch_page(
        &self,
        genre: &GenreName,
        request: PageRequest,
    ) -> Result<SourcePage<RawBook>, FetchError> {
        let url = self.search_url(genre, request);
        debug!("fetching Open Library page {}: {url}", request.page);
        let response: SearchResponse = self.client.get_json(&url)?;
        let records = response.docs.into_iter().map(RawBook::from).collect();
        let page = SourcePage::new(records);
        Ok(match response.num_found {
            Some(total) => page.with_total(total),
            None => page,
        })
    }

    fn normalize_record(
        &self,
        record: RawBook,
        matcher: &GenreMatcher,
    ) -> Result<BookDraft, RecordRejection> {
        record.normalize(self.source_api(), self.author_policy(), matcher)
    }
}
