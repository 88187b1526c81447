use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::first_non_empty;

/// LinkedIn job export/feed, already mapped to flat snake_case fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedInAdapter;

impl SourceAdapter for LinkedInAdapter {
    fn source(&self) -> Source {
        Source::LinkedIn
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        RawFields {
            title: first_non_empty(record, &["title"]),
            company: first_non_empty(record, &["company"]),
            location: first_non_empty(record, &["location"]),
            url: first_non_empty(record, &["url"]),
            posted: first_non_empty(record, &["posted_date", "listedAt"]),
        }
    }
}
