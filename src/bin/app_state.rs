use crate::config::CONFIG;
use crate::drawing::layout;
use crate::stats::Stats;
use geoview::*;
use lyon::math::point;

/// Everything one map view owns: markers, viewport, popup, theme and the
/// search machinery. The event loop only ever talks to the operations on
/// this struct, never to raw widget state.
pub struct AppState {
    pub markers: Vec<Marker>,
    pub screen: Screen,
    pub zoom: f32,
    pub popup: Popup,
    pub autocomplete: Autocomplete,
    pub theme: ThemeCache,
    pub stats: Stats,
    clusterer: GridClusterer,
    fetcher: SuggestionFetcher,
}

impl AppState {
    pub fn new(locations: &[Location], width: u32, height: u32, hidpi_factor: f64) -> Self {
        let mut state = Self {
            markers: Marker::from_listings(locations),
            screen: Screen::new(
                point(0.5, 0.5),
                width,
                height,
                CONFIG.map.tile_size,
                hidpi_factor,
            ),
            zoom: CONFIG.map.min_zoom,
            popup: Popup::new(),
            autocomplete: Autocomplete::new(CONFIG.search.min_length),
            theme: ThemeCache::try_load_from_file(&CONFIG.map.theme)
                .expect("Unable to load the theme file. Please consult the log."),
            stats: Stats::new(),
            clusterer: GridClusterer::new(CONFIG.map.grid_size, CONFIG.map.cluster_max_zoom),
            fetcher: SuggestionFetcher::new(&CONFIG.search.endpoint),
        };
        state.fit_to_markers();
        state
    }

    /// The cluster layout for the current viewport.
    pub fn clusters(&self) -> Vec<Cluster> {
        self.clusterer.cluster(&self.markers, &self.screen, self.zoom)
    }

    /// Fits the viewport to the smallest box containing every marker.
    pub fn fit_to_markers(&mut self) {
        let bounds = Bounds::from_points(self.markers.iter().map(|m| m.position));
        self.fit_to_bounds(&bounds);
    }

    fn fit_to_bounds(&mut self, bounds: &Bounds) {
        if bounds.is_empty() {
            return;
        }
        self.screen.center = bounds.center();
        self.zoom = self
            .screen
            .zoom_for_bounds(bounds, CONFIG.map.min_zoom, CONFIG.map.max_zoom);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).max(CONFIG.map.min_zoom).min(CONFIG.map.max_zoom);
    }

    pub fn pan(&mut self, delta: (f32, f32)) {
        let world_per_pixel = self.screen.world_per_pixel(self.zoom);
        self.screen.center.x -= delta.0 * world_per_pixel;
        self.screen.center.y -= delta.1 * world_per_pixel;
    }

    /// Routes a click, UI overlay first, then cluster and marker icons.
    pub fn handle_click(&mut self, position: (f32, f32)) {
        if self.autocomplete.is_open() {
            if let Some(i) = layout::suggestion_at(position, self.autocomplete.suggestions().len())
            {
                self.autocomplete.commit_at(i);
                return;
            }
        }

        let clusters = self.clusters();
        let collider = self.build_collider(&clusters);

        match collider.pick(position) {
            Some(MapEntity::Marker(i)) => {
                let marker = &self.markers[i];
                self.popup.show(marker.content.clone(), marker.position);
            }
            Some(MapEntity::Cluster(i)) => {
                // The aggregate icon zooms into its members, as the original
                // clustering widget did.
                self.fit_to_bounds(&clusters[i].bounds);
            }
            None => {}
        }
    }

    fn build_collider(&self, clusters: &[Cluster]) -> ClickCollider {
        let cluster_size = (
            self.theme.number("cluster", "width", 48.0),
            self.theme.number("cluster", "height", 48.0),
        );
        let marker_size = (
            self.theme.number("marker", "width", 12.0),
            self.theme.number("marker", "height", 18.0),
        );

        let mut collider = ClickCollider::new();
        for (i, cluster) in clusters.iter().enumerate() {
            let center = self.screen.world_to_screen(self.zoom, &cluster.center);
            if cluster.count() > 1 {
                collider.add_icon(
                    MapEntity::Cluster(i),
                    (center.x, center.y),
                    cluster_size.0,
                    cluster_size.1,
                );
            } else {
                collider.add_icon(
                    MapEntity::Marker(cluster.members[0]),
                    (center.x, center.y),
                    marker_size.0,
                    marker_size.1,
                );
            }
        }
        collider.update();
        collider
    }

    pub fn search_input(&mut self, c: char) {
        if let Some(term) = self.autocomplete.push_char(c) {
            self.fetcher.request(&term);
        }
    }

    pub fn search_backspace(&mut self) {
        if let Some(term) = self.autocomplete.backspace() {
            self.fetcher.request(&term);
        }
    }

    pub fn commit_search(&mut self) {
        if let Some(suggestion) = self.autocomplete.commit() {
            log::info!("Search committed with value '{}'.", suggestion.data);
        }
    }

    /// Drains the search channel; only the latest-generation response ever
    /// reaches the suggestion list.
    pub fn poll_search(&mut self) {
        if let Some(response) = self.fetcher.poll() {
            self.autocomplete.apply_response(&response);
        }
    }

    /// Centers the map on the host position, or surfaces the fixed error
    /// message in the popup without touching the viewport.
    pub fn locate_me(&mut self) {
        match current_position(CONFIG.locate.device.as_deref()) {
            Ok(fix) => {
                let position = project(fix.lat, fix.lon);
                self.screen.center = position;
                self.popup.show(MSG_FIND_AROUND, position);
            }
            Err(e) => {
                log::info!("Geolocation is unavailable. Reason:\r\n{:?}", e);
                let center = self.screen.center;
                self.popup.show(e.message(), center);
            }
        }
    }

    pub fn set_center(&mut self, center: (f32, f32)) {
        self.screen.center = project(center.0, center.1);
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
        ]
    }

    #[test]
    fn clicking_two_markers_keeps_a_single_popup() {
        let mut app = AppState::new(&listings(), 1280, 800, 1.0);
        // Zoom all the way in so both markers stand alone.
        app.zoom = CONFIG.map.max_zoom;

        for i in 0..2 {
            let position = app.markers[i].position;
            app.screen.center = position;
            let px = app.screen.world_to_screen(app.zoom, &position);
            app.handle_click((px.x, px.y));
        }

        assert!(app.popup.is_open());
        assert_eq!(app.popup.content(), "Globex");
    }

    #[test]
    fn startup_viewport_contains_every_marker() {
        let app = AppState::new(&listings(), 1280, 800, 1.0);

        for marker in &app.markers {
            let px = app.screen.world_to_screen(app.zoom, &marker.position);
            assert!(px.x >= -0.5 && px.x <= 1280.5);
            assert!(px.y >= -0.5 && px.y <= 800.5);
        }
    }

    #[test]
    fn denied_geolocation_shows_the_message_and_keeps_the_center() {
        let mut app = AppState::new(&listings(), 1280, 800, 1.0);
        let center = app.screen.center;

        // The default configuration has no position device.
        app.locate_me();

        assert!(app.popup.is_open());
        assert_eq!(app.popup.content(), MSG_UNSUPPORTED);
        assert_eq!(app.screen.center, center);
    }
}
