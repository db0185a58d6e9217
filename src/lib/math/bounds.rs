use lyon::math::{point, Point};

/// An axis-aligned box in world space.
///
/// Starts out empty and grows to the smallest box containing every point it
/// was extended with.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: point(std::f32::INFINITY, std::f32::INFINITY),
            max: point(std::f32::NEG_INFINITY, std::f32::NEG_INFINITY),
        }
    }

    /// The smallest box containing every point of the iterator.
    pub fn from_points(points: impl Iterator<Item = Point>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(&p);
        }
        bounds
    }

    pub fn extend(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Point {
        point(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.max.y - self.min.y).max(0.0)
    }
}

#[test]
fn bounds_contain_all_extended_points() {
    let points = [
        point(0.2, 0.3),
        point(0.7, 0.1),
        point(0.5, 0.9),
        point(0.2, 0.9),
    ];
    let bounds = Bounds::from_points(points.iter().copied());

    assert!(!bounds.is_empty());
    for p in &points {
        assert!(bounds.contains(p));
    }
}

#[test]
fn empty_bounds_contain_nothing() {
    let bounds = Bounds::empty();

    assert!(bounds.is_empty());
    assert!(!bounds.contains(&point(0.5, 0.5)));
}

#[test]
fn center_of_single_point_is_the_point() {
    let mut bounds = Bounds::empty();
    bounds.extend(&point(0.25, 0.75));

    assert_eq!(bounds.center(), point(0.25, 0.75));
    assert_eq!(bounds.width(), 0.0);
}
