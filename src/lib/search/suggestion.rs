use serde_derive::Deserialize;

/// A single autocomplete suggestion as served by the search backend.
///
/// `label` is what gets displayed; `data` is what ends up in the input when
/// the suggestion is taken.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub data: String,
}

#[derive(Debug)]
pub enum SearchError {
    /// The endpoint answered with a non-2xx status.
    Http(u16),
    Io(String),
    /// The payload did not decode into a suggestion list.
    Malformed(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SearchError::Http(status) => write!(f, "search request failed with status {}", status),
            SearchError::Io(e) => write!(f, "search request failed: {}", e),
            SearchError::Malformed(e) => write!(f, "malformed suggestion payload: {}", e),
        }
    }
}

impl std::error::Error for SearchError {}

/// Decodes a suggestion payload, in server order.
///
/// Anything that is not a list of objects with non-empty `label` and `data`
/// strings is rejected instead of being passed through to the view.
pub fn decode_suggestions(body: &str) -> Result<Vec<Suggestion>, SearchError> {
    let suggestions: Vec<Suggestion> =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    for suggestion in &suggestions {
        if suggestion.label.is_empty() || suggestion.data.is_empty() {
            return Err(SearchError::Malformed(
                "suggestion with an empty label or data field".into(),
            ));
        }
    }

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_in_server_order() {
        let suggestions = decode_suggestions(
            r#"[
                {"label": "Acme Corp (company)", "data": "42"},
                {"label": "Aarau (city)", "data": "aarau"}
            ]"#,
        )
        .unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].label, "Acme Corp (company)");
        assert_eq!(suggestions[0].data, "42");
        assert_eq!(suggestions[1].data, "aarau");
    }

    #[test]
    fn rejects_non_lists() {
        assert!(matches!(
            decode_suggestions(r#"{"label": "x", "data": "y"}"#),
            Err(SearchError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            decode_suggestions(r#"[{"label": "only a label"}]"#),
            Err(SearchError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_empty_fields() {
        assert!(matches!(
            decode_suggestions(r#"[{"label": "", "data": "42"}]"#),
            Err(SearchError::Malformed(_))
        ));
    }
}
