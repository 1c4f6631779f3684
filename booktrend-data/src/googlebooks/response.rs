//! Google Books volumes API response types.
//!
//! See: <https://developers.google.com/books/docs/v1/reference/volumes/list>

use booktrend_core::{GenreEvidence, RawBook, RawYear, SourcePage};
use serde::Deserialize;

/// Body of a `volumes` search response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    /// Approximate total hits for the query.
    pub total_items: Option<u64>,
    /// Volumes for the requested window. Absent once results run out.
    pub items: Option<Vec<Volume>>,
}

/// One volume in a search response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Bibliographic details.
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

/// Bibliographic details of a volume.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    /// Volume title.
    pub title: Option<String>,
    /// Author names in credit order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication date, e.g. `"2004"` or `"2004-05-01"`.
    pub published_date: Option<String>,
    /// Publisher categories.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl VolumesResponse {
    /// Convert into a source page.
    ///
    /// `totalItems` is an estimate that can undershoot what later windows
    /// still serve, so it is never attached as a total; only an empty or
    /// `items`-less page ends a run.
    #[must_use]
    pub fn into_page(self) -> SourcePage<RawBook> {
        let records = self
            .items
            .unwrap_or_default()
            .into_iter()
            .map(RawBook::from)
            .collect();
        SourcePage::new(records)
    }
}

impl From<Volume> for RawBook {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        Self {
            title: info.title,
            authors: info.authors,
            published: info.published_date.map(RawYear::Date),
            evidence: GenreEvidence::QueryMatched {
                category: info.categories.into_iter().next(),
            },
        }
    }
}
