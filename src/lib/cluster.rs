use super::*;
use lyon::math::Point;

/// A group of markers rendered as one aggregate icon.
///
/// A cluster of one member is rendered as the plain marker.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// World space position of the cluster icon. This is the position of the
    /// seed marker, the first one that opened the cluster.
    pub center: Point,
    /// Indices into the marker slice the cluster was built from.
    pub members: Vec<usize>,
    /// The bounds of all member positions, used to fit the viewport when the
    /// cluster is clicked.
    pub bounds: Bounds,
}

impl Cluster {
    fn seed(index: usize, position: Point) -> Self {
        let mut bounds = Bounds::empty();
        bounds.extend(&position);
        Self {
            center: position,
            members: vec![index],
            bounds,
        }
    }

    fn push(&mut self, index: usize, position: Point) {
        self.members.push(index);
        self.bounds.extend(&position);
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Grid clustering with a fixed pixel radius.
///
/// Markers whose screen distance to an open cluster's icon is below the grid
/// size join that cluster; everyone else opens a new one. Above `max_zoom`
/// clustering is off and every marker stands alone.
pub struct GridClusterer {
    grid_size: u32,
    max_zoom: f32,
}

impl GridClusterer {
    pub fn new(grid_size: u32, max_zoom: f32) -> Self {
        Self {
            grid_size,
            max_zoom,
        }
    }

    /// Groups `markers` into clusters for the given viewport.
    ///
    /// Every marker lands in exactly one cluster; input order decides which
    /// cluster opens first, as the original grid widget did.
    pub fn cluster(&self, markers: &[Marker], screen: &Screen, zoom: f32) -> Vec<Cluster> {
        if zoom > self.max_zoom {
            return markers
                .iter()
                .enumerate()
                .map(|(i, m)| Cluster::seed(i, m.position))
                .collect();
        }

        let grid_size = self.grid_size as f32;
        let mut clusters: Vec<Cluster> = vec![];

        for (i, marker) in markers.iter().enumerate() {
            let screen_pos = screen.world_to_screen(zoom, &marker.position);
            let joined = clusters.iter_mut().find(|cluster| {
                let cluster_pos = screen.world_to_screen(zoom, &cluster.center);
                (screen_pos - cluster_pos).length() <= grid_size
            });

            match joined {
                Some(cluster) => cluster.push(i, marker.position),
                None => clusters.push(Cluster::seed(i, marker.position)),
            }
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn marker(world: Point) -> Marker {
        Marker {
            position: world,
            content: String::new(),
        }
    }

    fn screen() -> Screen {
        Screen::new(point(0.5, 0.5), 800, 600, 256, 1.0)
    }

    #[test]
    fn close_markers_share_a_cluster() {
        // Two markers a fraction of a pixel apart at low zoom, one far away.
        let markers = vec![
            marker(point(0.5, 0.5)),
            marker(point(0.5001, 0.5001)),
            marker(point(0.8, 0.8)),
        ];

        let clusters = GridClusterer::new(50, 15.0).cluster(&markers, &screen(), 3.0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count(), 2);
        assert_eq!(clusters[1].count(), 1);
    }

    #[test]
    fn no_marker_is_lost_or_duplicated() {
        let markers: Vec<_> = (0..20)
            .map(|i| marker(point(0.4 + i as f32 * 0.01, 0.5)))
            .collect();

        let clusters = GridClusterer::new(50, 15.0).cluster(&markers, &screen(), 5.0);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn clustering_is_off_past_max_zoom() {
        let markers = vec![marker(point(0.5, 0.5)), marker(point(0.5001, 0.5001))];

        let clusters = GridClusterer::new(50, 15.0).cluster(&markers, &screen(), 16.0);

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.count() == 1));
    }

    #[test]
    fn cluster_bounds_contain_all_members() {
        let markers = vec![
            marker(point(0.5, 0.5)),
            marker(point(0.5001, 0.5002)),
            marker(point(0.4999, 0.4998)),
        ];

        let clusters = GridClusterer::new(50, 15.0).cluster(&markers, &screen(), 3.0);

        assert_eq!(clusters.len(), 1);
        for member in &clusters[0].members {
            assert!(clusters[0].bounds.contains(&markers[*member].position));
        }
    }
}
