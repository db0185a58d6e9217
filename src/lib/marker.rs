use super::*;
use lyon::math::Point;

/// A point annotation on the map, derived 1:1 from a [`Location`].
///
/// Markers are created once at initialization and never mutated.
#[derive(Debug, Clone)]
pub struct Marker {
    /// The projected world space position.
    pub position: Point,
    /// The content shown in the popup when the marker is clicked.
    pub content: String,
}

impl Marker {
    pub fn from_location(location: &Location) -> Self {
        Self {
            position: project(location.lat, location.lon),
            content: location.label.clone(),
        }
    }

    /// One marker per location, in input order.
    pub fn from_listings(locations: &[Location]) -> Vec<Self> {
        locations.iter().map(Self::from_location).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings() -> Vec<Location> {
        vec![
            Location {
                lat: 45.5017,
                lon: -73.5673,
                label: "Acme Corp".into(),
            },
            Location {
                lat: 47.3769,
                lon: 8.5417,
                label: "Globex".into(),
            },
            Location {
                lat: 35.6762,
                lon: 139.6503,
                label: "Initech".into(),
            },
        ]
    }

    #[test]
    fn one_marker_per_location() {
        let locations = listings();
        let markers = Marker::from_listings(&locations);

        assert_eq!(markers.len(), locations.len());
        for (marker, location) in markers.iter().zip(&locations) {
            assert_eq!(marker.content, location.label);
        }
    }

    #[test]
    fn marker_bounds_contain_every_position() {
        let markers = Marker::from_listings(&listings());
        let bounds = Bounds::from_points(markers.iter().map(|m| m.position));

        for marker in &markers {
            assert!(bounds.contains(&marker.position));
        }
    }
}
