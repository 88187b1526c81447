use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::{first_non_empty, nested_str};

/// Lever postings API (`/v0/postings/<company>?mode=json`).
///
/// Titles live in `text`, and the location is usually nested under
/// `categories.location`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeverAdapter;

impl SourceAdapter for LeverAdapter {
    fn source(&self) -> Source {
        Source::Lever
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        let mut location = nested_str(record, "categories", "location");
        if location.is_empty() {
            location = first_non_empty(record, &["location"]);
        }

        RawFields {
            title: first_non_empty(record, &["text", "title"]),
            company: first_non_empty(record, &["company"]),
            location,
            url: first_non_empty(record, &["hostedUrl", "url"]),
            posted: first_non_empty(record, &["createdAt", "publishedAt"]),
        }
    }
}
