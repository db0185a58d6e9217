//! Fixed overlay geometry, shared between the painter and click routing.

/// Search box position and size, in pixels from the top-left corner.
pub const SEARCH_X: f32 = 12.0;
pub const SEARCH_Y: f32 = 12.0;
pub const SEARCH_WIDTH: f32 = 320.0;
pub const SEARCH_HEIGHT: f32 = 28.0;
/// Height of one suggestion row below the search box.
pub const SUGGESTION_HEIGHT: f32 = 24.0;

/// Popup panel size. The width is the one the original info window used.
pub const POPUP_WIDTH: f32 = 250.0;
pub const POPUP_HEIGHT: f32 = 64.0;
/// Gap between the popup panel and its anchor.
pub const POPUP_OFFSET: f32 = 16.0;

/// The suggestion row under `position`, if any.
pub fn suggestion_at(position: (f32, f32), count: usize) -> Option<usize> {
    let x = position.0 - SEARCH_X;
    let y = position.1 - (SEARCH_Y + SEARCH_HEIGHT);

    if x < 0.0 || x > SEARCH_WIDTH || y < 0.0 || y >= count as f32 * SUGGESTION_HEIGHT {
        return None;
    }

    Some((y / SUGGESTION_HEIGHT) as usize)
}

#[test]
fn rows_resolve_to_their_index() {
    assert_eq!(suggestion_at((20.0, SEARCH_Y + SEARCH_HEIGHT + 1.0), 3), Some(0));
    assert_eq!(
        suggestion_at((20.0, SEARCH_Y + SEARCH_HEIGHT + SUGGESTION_HEIGHT + 1.0), 3),
        Some(1)
    );
}

#[test]
fn outside_the_list_is_no_hit() {
    assert_eq!(suggestion_at((500.0, 60.0), 3), None);
    assert_eq!(suggestion_at((20.0, 5000.0), 3), None);
    assert_eq!(suggestion_at((20.0, SEARCH_Y + SEARCH_HEIGHT + 1.0), 0), None);
}
