use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::{first_non_empty, nested_str};

/// Greenhouse job board API. `location` is either `{ "name": ... }` or a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreenhouseAdapter;

impl SourceAdapter for GreenhouseAdapter {
    fn source(&self) -> Source {
        Source::Greenhouse
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        let location = match record.get("location") {
            Some(Value::Object(_)) => nested_str(record, "location", "name"),
            _ => first_non_empty(record, &["location"]),
        };

        RawFields {
            title: first_non_empty(record, &["title"]),
            company: first_non_empty(record, &["company"]),
            location,
            url: first_non_empty(record, &["absolute_url", "url"]),
            posted: first_non_empty(record, &["updated_at", "created_at"]),
        }
    }
}
