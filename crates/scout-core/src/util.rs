use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Render a JSON scalar as a trimmed string.
///
/// Numbers and booleans are rendered; null, missing, arrays, and objects
/// become the empty string.
pub fn value_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// First non-empty string among `keys`, in order.
pub fn first_non_empty(record: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| value_to_string(record.get(*key)))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// `record[outer][inner]` when `record[outer]` is an object, otherwise empty.
pub fn nested_str(record: &Map<String, Value>, outer: &str, inner: &str) -> String {
    match record.get(outer) {
        Some(Value::Object(obj)) => value_to_string(obj.get(inner)),
        _ => String::new(),
    }
}

/// Normalize a raw posted date to `YYYY-MM-DD`.
///
/// Takes the first ten characters when they look like `DDDD-DD-DD`;
/// anything else falls back to `today`.
pub fn normalize_posted_date(raw: &str, today: NaiveDate) -> String {
    let bytes = raw.trim().as_bytes();
    let looks_like_date = bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if looks_like_date {
        // The first ten bytes are ASCII, so this is a char boundary.
        raw.trim()[..10].to_string()
    } else {
        today.format("%Y-%m-%d").to_string()
    }
}

/// Lowercase and trim each term, dropping empties.
pub fn normalize_terms<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercase and collapse internal whitespace.
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse common boolean spellings (`1/true/yes/on`, `0/false/no/off`).
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn value_to_string_coerces_scalars() {
        assert_eq!(value_to_string(Some(&json!("  hi "))), "hi");
        assert_eq!(value_to_string(Some(&json!(42))), "42");
        assert_eq!(value_to_string(Some(&json!(true))), "true");
        assert_eq!(value_to_string(Some(&json!(null))), "");
        assert_eq!(value_to_string(Some(&json!({"a": 1}))), "");
        assert_eq!(value_to_string(None), "");
    }

    #[test]
    fn first_non_empty_skips_blank_values() {
        let record = json!({"text": "  ", "title": "Engineer"});
        let record = record.as_object().unwrap();
        assert_eq!(first_non_empty(record, &["text", "title"]), "Engineer");
        assert_eq!(first_non_empty(record, &["missing"]), "");
    }

    #[test]
    fn nested_str_requires_object() {
        let record = json!({"location": {"name": "Berlin"}, "flat": "x"});
        let record = record.as_object().unwrap();
        assert_eq!(nested_str(record, "location", "name"), "Berlin");
        assert_eq!(nested_str(record, "flat", "name"), "");
    }

    #[test]
    fn posted_date_takes_iso_prefix() {
        assert_eq!(normalize_posted_date("2024-05-01T10:00:00Z", today()), "2024-05-01");
        assert_eq!(normalize_posted_date("2024-05-01", today()), "2024-05-01");
    }

    #[test]
    fn posted_date_falls_back_to_today() {
        assert_eq!(normalize_posted_date("", today()), "2026-03-14");
        assert_eq!(normalize_posted_date("yesterday", today()), "2026-03-14");
        assert_eq!(normalize_posted_date("05/01/2024", today()), "2026-03-14");
        assert_eq!(normalize_posted_date("1714557600000", today()), "2026-03-14");
    }

    #[test]
    fn posted_date_survives_multibyte_input() {
        assert_eq!(normalize_posted_date("2024-é5-01xx", today()), "2026-03-14");
    }

    #[test]
    fn normalize_terms_drops_blanks() {
        assert_eq!(
            normalize_terms(&[" Rust ", "", "  ", "GO"]),
            vec!["rust".to_string(), "go".to_string()]
        );
    }

    #[test]
    fn normalize_title_collapses_whitespace() {
        assert_eq!(normalize_title("  Senior   Rust\tEngineer "), "senior rust engineer");
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
