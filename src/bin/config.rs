use once_cell::sync::Lazy;
use serde_derive::Deserialize;

pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::new().expect("Config could not be loaded."));

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: log::Level,
    pub display_framerate: bool,
    pub listings: String,
    pub ui_font: String,
}

#[derive(Debug, Deserialize)]
pub struct Map {
    pub theme: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub tile_size: u32,
    pub msaa_samples: u32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Pixel radius of the marker clustering grid.
    pub grid_size: u32,
    /// Past this zoom markers are never clustered.
    pub cluster_max_zoom: f32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
    pub endpoint: String,
    pub min_length: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct Locate {
    /// NMEA device to read the host position from. Unset means the host has
    /// no position source.
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub map: Map,
    pub search: Search,
    #[serde(default)]
    pub locate: Locate,
}

impl Config {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut s = config::Config::new();

        // Start off by merging in the "default" configuration file
        s.merge(config::File::with_name("config/default"))?;

        // Add in a local configuration file
        // This file shouldn't be checked in to git
        s.merge(config::File::with_name("config/local").required(false))?;

        // You can deserialize (and thus freeze) the entire configuration as
        s.try_into()
    }
}
