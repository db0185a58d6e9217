use nalgebra::Point2;
use ncollide2d::{
    math::{Isometry, Vector},
    pipeline::object::{CollisionGroups, GeometricQueryType},
    query::PointQuery,
    shape::{Cuboid, ShapeHandle},
    world::CollisionWorld,
};

/// Anything on the map a click can land on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapEntity {
    /// Index into the marker slice.
    Marker(usize),
    /// Index into the cluster list of the current frame.
    Cluster(usize),
}

/// Hit testing for marker and cluster icons.
///
/// Icons are registered as screen space boxes; a click point is tested
/// against them. Rebuilt whenever the cluster layout changes, which is cheap
/// at these entity counts.
pub struct ClickCollider {
    world: CollisionWorld<f32, MapEntity>,
}

impl ClickCollider {
    pub fn new() -> Self {
        Self {
            world: CollisionWorld::new(0.02),
        }
    }

    /// Registers an icon box centered at `center` (screen pixels).
    pub fn add_icon(&mut self, entity: MapEntity, center: (f32, f32), width: f32, height: f32) {
        self.world.add(
            Isometry::new(Vector::new(center.0, center.1), 0.0),
            ShapeHandle::new(Cuboid::new(Vector::new(width / 2.0, height / 2.0))),
            CollisionGroups::new(),
            GeometricQueryType::Contacts(0.02, 0.02),
            entity,
        );
    }

    pub fn update(&mut self) {
        self.world.update()
    }

    /// Returns the entity under `point`, clusters before markers.
    pub fn pick(&self, point: (f32, f32)) -> Option<MapEntity> {
        let point = Point2::new(point.0, point.1);

        let mut interferences = vec![];
        self.world
            .broad_phase
            .interferences_with_point(&point, &mut interferences);

        let mut hits = vec![];
        for handle in interferences {
            if let Some(co) = self.world.collision_object(*handle) {
                if let Some(cuboid) = co.shape().downcast_ref::<Cuboid<f32>>() {
                    if cuboid.contains_point(co.position(), &point) {
                        hits.push(*co.data());
                    }
                }
            }
        }

        hits.sort_by_key(|entity| match entity {
            MapEntity::Cluster(_) => 0,
            MapEntity::Marker(_) => 1,
        });
        hits.first().copied()
    }
}

impl Default for ClickCollider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_icon_under_the_cursor() {
        let mut collider = ClickCollider::new();
        collider.add_icon(MapEntity::Marker(3), (100.0, 100.0), 12.0, 18.0);
        collider.add_icon(MapEntity::Cluster(0), (300.0, 200.0), 48.0, 48.0);
        collider.update();

        assert_eq!(collider.pick((102.0, 95.0)), Some(MapEntity::Marker(3)));
        assert_eq!(collider.pick((320.0, 210.0)), Some(MapEntity::Cluster(0)));
        assert_eq!(collider.pick((500.0, 500.0)), None);
    }

    #[test]
    fn clusters_win_over_overlapping_markers() {
        let mut collider = ClickCollider::new();
        collider.add_icon(MapEntity::Marker(0), (100.0, 100.0), 12.0, 18.0);
        collider.add_icon(MapEntity::Cluster(1), (100.0, 100.0), 48.0, 48.0);
        collider.update();

        assert_eq!(collider.pick((100.0, 100.0)), Some(MapEntity::Cluster(1)));
    }
}
