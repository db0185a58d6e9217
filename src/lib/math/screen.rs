use super::*;

pub struct Screen {
    pub center: Point,
    pub width: u32,
    pub height: u32,
    tile_size: u32,
}

impl Screen {
    pub fn new(center: Point, width: u32, height: u32, tile_size: u32, hidpi_factor: f64) -> Self {
        Self {
            center,
            width,
            height,
            tile_size: (tile_size as f64 * hidpi_factor) as u32,
        }
    }

    pub fn get_tile_size(&self) -> u32 {
        self.tile_size
    }

    /// World units per pixel grow with the tile size and shrink with the zoom.
    fn scale(&self, z: f32) -> f32 {
        self.get_tile_size() as f32 * 2f32.powf(z)
    }

    /// Converts a world space position into screen pixels at zoom `z`.
    pub fn world_to_screen(&self, z: f32, world: &Point) -> Point {
        let scale = self.scale(z);
        point(
            (world.x - self.center.x) * scale + self.width as f32 / 2.0,
            (world.y - self.center.y) * scale + self.height as f32 / 2.0,
        )
    }

    /// World units covered by one pixel at zoom `z`.
    pub fn world_per_pixel(&self, z: f32) -> f32 {
        1.0 / self.scale(z)
    }

    /// Converts a screen pixel position back into world space at zoom `z`.
    pub fn screen_to_world(&self, z: f32, screen: &Point) -> Point {
        let scale = self.scale(z);
        point(
            (screen.x - self.width as f32 / 2.0) / scale + self.center.x,
            (screen.y - self.height as f32 / 2.0) / scale + self.center.y,
        )
    }

    /// The greatest zoom at which `bounds` is entirely visible, clamped into
    /// `[min_zoom, max_zoom]`.
    ///
    /// Degenerate bounds (a single position) fit at any zoom and yield
    /// `max_zoom`.
    pub fn zoom_for_bounds(&self, bounds: &Bounds, min_zoom: f32, max_zoom: f32) -> f32 {
        let tile_size = self.get_tile_size() as f32;

        let zx = if bounds.width() > 0.0 {
            (self.width as f32 / (bounds.width() * tile_size)).log2()
        } else {
            max_zoom
        };
        let zy = if bounds.height() > 0.0 {
            (self.height as f32 / (bounds.height() * tile_size)).log2()
        } else {
            max_zoom
        };

        zx.min(zy).min(max_zoom).max(min_zoom)
    }
}

#[test]
fn world_screen_roundtrip() {
    let screen = Screen::new(point(0.5, 0.5), 800, 600, 256, 1.0);
    let world = point(0.512, 0.497);
    let px = screen.world_to_screen(6.0, &world);
    let back = screen.screen_to_world(6.0, &px);

    assert!((world.x - back.x).abs() < 1e-6);
    assert!((world.y - back.y).abs() < 1e-6);
}

#[test]
fn screen_center_maps_to_viewport_center() {
    let screen = Screen::new(point(0.3, 0.7), 800, 600, 256, 1.0);
    let px = screen.world_to_screen(4.0, &point(0.3, 0.7));

    assert_eq!(px, point(400.0, 300.0));
}

#[test]
fn fitted_bounds_are_fully_visible() {
    let mut screen = Screen::new(point(0.5, 0.5), 800, 600, 256, 1.0);
    let bounds = Bounds::from_points([point(0.4, 0.45), point(0.6, 0.55)].iter().copied());

    screen.center = bounds.center();
    let z = screen.zoom_for_bounds(&bounds, 3.0, 18.0);

    let tl = screen.world_to_screen(z, &point(0.4, 0.45));
    let br = screen.world_to_screen(z, &point(0.6, 0.55));
    assert!(tl.x >= -0.5 && tl.y >= -0.5);
    assert!(br.x <= 800.5 && br.y <= 600.5);
}

#[test]
fn degenerate_bounds_fit_at_max_zoom() {
    let screen = Screen::new(point(0.5, 0.5), 800, 600, 256, 1.0);
    let bounds = Bounds::from_points(std::iter::once(point(0.5, 0.5)));

    assert_eq!(screen.zoom_for_bounds(&bounds, 3.0, 18.0), 18.0);
}
