use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::first_non_empty;

#[derive(Debug, Default, Clone, Copy)]
pub struct CraigslistAdapter;

impl SourceAdapter for CraigslistAdapter {
    fn source(&self) -> Source {
        Source::Craigslist
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        RawFields {
            title: first_non_empty(record, &["title"]),
            company: first_non_empty(record, &["company"]),
            location: first_non_empty(record, &["location"]),
            url: first_non_empty(record, &["url"]),
            posted: first_non_empty(record, &["datePosted", "publishedAt"]),
        }
    }
}
