use std::path::Path;

/// A single listing entry as supplied by the backend.
///
/// The sequence order of the input is preserved everywhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub lat: f32,
    pub lon: f32,
    pub label: String,
}

#[derive(Debug)]
pub enum ListingError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
}

impl std::fmt::Display for ListingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ListingError::Io(e) => write!(f, "could not read the listing file: {}", e),
            ListingError::Malformed(e) => write!(f, "the listing file is malformed: {}", e),
        }
    }
}

impl std::error::Error for ListingError {}

/// Loads an ordered listing sequence from a JSON file.
///
/// The file holds an array of `[lat, lon, label]` triples, the shape the
/// listing backend serves.
pub fn load_listings(path: impl AsRef<Path>) -> Result<Vec<Location>, ListingError> {
    let raw = std::fs::read_to_string(path).map_err(ListingError::Io)?;
    let triples: Vec<(f32, f32, String)> =
        serde_json::from_str(&raw).map_err(ListingError::Malformed)?;

    Ok(triples
        .into_iter()
        .map(|(lat, lon, label)| Location { lat, lon, label })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_parse_in_order() {
        let path = std::env::temp_dir().join("placemark-listings-test.json");
        std::fs::write(
            &path,
            r#"[[45.5017, -73.5673, "Acme Corp"], [47.3769, 8.5417, "Globex"]]"#,
        )
        .unwrap();

        let listings = load_listings(&path).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].label, "Acme Corp");
        assert_eq!(listings[1].label, "Globex");
    }

    #[test]
    fn malformed_listings_are_rejected() {
        let path = std::env::temp_dir().join("placemark-listings-bad.json");
        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();

        assert!(matches!(
            load_listings(&path),
            Err(ListingError::Malformed(_))
        ));
    }
}
