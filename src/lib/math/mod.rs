mod bounds;
mod screen;

use lyon::math::{point, Point};
use std::f32::consts::PI;

pub use bounds::*;
pub use screen::*;

fn deg2rad(deg: f32) -> f32 {
    2.0 * PI * deg / 360.0
}

/// Projects WGS84 degrees into unit web mercator space.
///
/// The whole world maps onto `[0, 1] x [0, 1]` with the origin at the
/// north-western corner.
pub fn project(lat_deg: f32, lon_deg: f32) -> Point {
    let lat_rad = deg2rad(lat_deg);
    let x = (lon_deg + 180.0) / 360.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;

    point(x, y)
}

/// Inverse of [`project`]. Returns `(lat, lon)` in degrees.
pub fn unproject(world: &Point) -> (f32, f32) {
    let lon = world.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * world.y)).sinh().atan().to_degrees();

    (lat, lon)
}

#[test]
fn project_roundtrips() {
    let (lat, lon) = (47.3769, 8.5417);
    let world = project(lat, lon);
    let (lat2, lon2) = unproject(&world);

    assert!((lat - lat2).abs() < 1e-3);
    assert!((lon - lon2).abs() < 1e-3);
}

#[test]
fn null_island_is_center() {
    let world = project(0.0, 0.0);

    assert!((world.x - 0.5).abs() < 1e-6);
    assert!((world.y - 0.5).abs() < 1e-6);
}
