use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::first_non_empty;

/// Indeed publisher feed. Needs `INDEED_API_KEY` (or `INDEED_PUBLISHER_KEY`).
#[derive(Debug, Default, Clone, Copy)]
pub struct IndeedAdapter;

impl SourceAdapter for IndeedAdapter {
    fn source(&self) -> Source {
        Source::Indeed
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        RawFields {
            title: first_non_empty(record, &["title"]),
            company: first_non_empty(record, &["company"]),
            location: first_non_empty(record, &["location"]),
            url: first_non_empty(record, &["url"]),
            posted: first_non_empty(record, &["datePublished", "publishedAt"]),
        }
    }
}
