use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::first_non_empty;

/// Google Jobs search proxy. Requires an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleJobsAdapter;

impl SourceAdapter for GoogleJobsAdapter {
    fn source(&self) -> Source {
        Source::GoogleJobs
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerces_numeric_company() {
        let raw = json!({
            "title": "ML Engineer",
            "company": 1999,
            "url": "https://g/1"
        });
        let fields = GoogleJobsAdapter.map_fields(raw.as_object().unwrap());
        assert_eq!(fields.company, "1999");
    }
}
