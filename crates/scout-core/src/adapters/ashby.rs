use serde_json::{Map, Value};

use super::{RawFields, SourceAdapter};
use crate::models::Source;
use crate::util::first_non_empty;

/// Ashby job postings API. Requires an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct AshbyAdapter;

impl SourceAdapter for AshbyAdapter {
    fn source(&self) -> Source {
        Source::Ashby
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    fn map_fields(&self, record: &Map<String, Value>) -> RawFields {
        RawFields {
            title: first_non_empty(record, &["title"]),
            company: first_non_empty(record, &["companyName", "company"]),
            location: first_non_empty(record, &["location"]),
            url: first_non_empty(record, &["jobUrl", "url"]),
            posted: first_non_empty(record, &["publishedAt", "createdAt"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_ashby_fields() {
        let raw = json!({
            "title": "Platform Engineer",
            "companyName": "Acme",
            "location": "London",
            "jobUrl": "https://jobs.ashbyhq.com/acme/3",
            "publishedAt": "2024-04-01T00:00:00.000Z"
        });
        let fields = AshbyAdapter.map_fields(raw.as_object().unwrap());
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.url, "https://jobs.ashbyhq.com/acme/3");
        assert_eq!(fields.posted, "2024-04-01T00:00:00.000Z");
        assert!(AshbyAdapter.requires_api_key());
    }
}
