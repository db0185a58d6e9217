use lyon::math::{point, Point};

/// The single shared info popup.
///
/// There is exactly one popup per map view. Showing it for another anchor
/// replaces its content instead of stacking a second one.
#[derive(Debug)]
pub struct Popup {
    content: String,
    anchor: Point,
    open: bool,
}

impl Popup {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            anchor: point(0.0, 0.0),
            open: false,
        }
    }

    /// Opens the popup at `anchor`, replacing whatever it showed before.
    pub fn show(&mut self, content: impl Into<String>, anchor: Point) {
        self.content = content.into();
        self.anchor = anchor;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The world space position the popup is anchored to.
    pub fn anchor(&self) -> Point {
        self.anchor
    }
}

impl Default for Popup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_show_replaces_the_first() {
        let mut popup = Popup::new();

        popup.show("marker i", point(0.1, 0.1));
        popup.show("marker j", point(0.9, 0.9));

        assert!(popup.is_open());
        assert_eq!(popup.content(), "marker j");
        assert_eq!(popup.anchor(), point(0.9, 0.9));
    }

    #[test]
    fn closed_popup_keeps_no_visible_state() {
        let mut popup = Popup::new();
        popup.show("something", point(0.5, 0.5));
        popup.close();

        assert!(!popup.is_open());
    }
}
