//! Picks a parsing strategy for an upload from its name.

use leakdex_core::SourceFormat;

/// Choose the extractor for `name` (a filename or URL).
///
/// Only the extension is inspected: `.csv` is tabular, `.json` is a JSON
/// array, anything else is read line by line. `content_type` is consulted
/// only when the name has no extension at all.
pub fn classify(name: &str, content_type: Option<&str>) -> SourceFormat {
    let name = strip_url_suffix(name).to_lowercase();

    if name.ends_with(".csv") {
        return SourceFormat::Tabular;
    }
    if name.ends_with(".json") {
        return SourceFormat::Structured;
    }
    if has_extension(&name) {
        return SourceFormat::LineHeuristic;
    }

    match content_type.map(mime_essence).as_deref() {
        Some("text/csv") => SourceFormat::Tabular,
        Some("application/json") => SourceFormat::Structured,
        _ => SourceFormat::LineHeuristic,
    }
}

/// Drop the query string and fragment of a URL.
fn strip_url_suffix(name: &str) -> &str {
    if !name.contains("://") {
        return name;
    }
    name.split(['?', '#']).next().unwrap_or(name)
}

fn has_extension(name: &str) -> bool {
    let segment = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match segment.rfind('.') {
        Some(i) => i > 0 && i + 1 < segment.len(),
        None => false,
    }
}

fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_routing() {
        assert_eq!(classify("users.csv", None), SourceFormat::Tabular);
        assert_eq!(classify("USERS.CSV", None), SourceFormat::Tabular);
        assert_eq!(classify("dump.json", None), SourceFormat::Structured);
        assert_eq!(classify("dump.jsonl", None), SourceFormat::LineHeuristic);
        assert_eq!(classify("combo.txt", None), SourceFormat::LineHeuristic);
        assert_eq!(classify("backup.sql", None), SourceFormat::LineHeuristic);
        assert_eq!(classify("combolist", None), SourceFormat::LineHeuristic);
    }

    #[test]
    fn test_url_query_is_ignored() {
        assert_eq!(
            classify("https://files.example.com/leak.csv?token=abc", None),
            SourceFormat::Tabular
        );
        assert_eq!(
            classify("https://files.example.com/leak.json#part", None),
            SourceFormat::Structured
        );
    }

    #[test]
    fn test_hint_only_without_extension() {
        assert_eq!(
            classify("url_download", Some("text/csv; charset=utf-8")),
            SourceFormat::Tabular
        );
        assert_eq!(
            classify("url_export", Some("Application/JSON")),
            SourceFormat::Structured
        );
        // An extension always beats the hint.
        assert_eq!(
            classify("combo.txt", Some("application/json")),
            SourceFormat::LineHeuristic
        );
        assert_eq!(classify("blob", Some("text/plain")), SourceFormat::LineHeuristic);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.txt"));
        assert!(!has_extension(".hidden"));
        assert!(!has_extension("trailing."));
        assert!(!has_extension("dir.d/file"));
    }
}
