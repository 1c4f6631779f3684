//! Open Library search API response types.
//!
//! See: <https://openlibrary.org/dev/docs/api/search>

use booktrend_core::{GenreEvidence, RawBook, RawYear};
use serde::Deserialize;

/// Body of a `search.json` response.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// Total hits for the query.
    #[serde(rename = "numFound")]
    pub num_found: Option<u64>,
    /// Matching documents for the requested window.
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

/// One work in a search response.
#[derive(Debug, Default, Deserialize)]
pub struct SearchDoc {
    /// Work title.
    pub title: Option<String>,
    /// Author names in credit order.
    #[serde(default)]
    pub author_name: Vec<String>,
    /// Year of first publication.
    pub first_publish_year: Option<i64>,
    /// Free-form subject tags.
    #[serde(default)]
    pub subject: Vec<String>,
}

impl From<SearchDoc> for RawBook {
    fn from(doc: SearchDoc) -> Self {
        Self {
            title: doc.title,
            authors: doc.author_name,
            published: doc.first_publish_year.map(RawYear::Year),
            evidence: GenreEvidence::Subjects(doc.subject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialise_search_response() {
        let json = r#"{
            "numFound": 2,
            "start": 0,
            "docs": [
                {
                    "title": "The Hobbit",
                    "author_name": ["J.R.R. Tolkien"],
                    "first_publish_year": 1937,
                    "subject": ["Fantasy fiction", "Dragons"]
                },
                { "title": "Untagged" }
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).expect("valid response");
        assert_eq!(response.num_found, Some(2));
        assert_eq!(response.docs.len(), 2);
        let untagged = response.docs.get(1).expect("second doc");
        assert!(untagged.author_name.is_empty());
        assert!(untagged.subject.is_empty());
        assert_eq!(untagged.first_publish_year, None);
    }

    #[rstest]
    fn missing_docs_is_an_empty_page() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"numFound": 0}"#).expect("valid response");
        assert!(response.docs.is_empty());
    }

    #[rstest]
    fn converts_doc_to_raw_book() {
        let doc = SearchDoc {
            title: Some("Dune".into()),
            author_name: vec!["Frank Herbert".into()],
            first_publish_year: Some(1965),
            subject: vec!["Science fiction".into()],
        };
        let raw = RawBook::from(doc);
        assert_eq!(raw.published, Some(RawYear::Year(1965)));
        assert_eq!(
            raw.evidence,
            GenreEvidence::Subjects(vec!["Science fiction".into()])
        );
    }
}
