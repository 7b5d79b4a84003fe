use serde::Deserialize;

use crate::ordering::SortOrder;

/// Options for a place-list session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Seconds between position updates while ordered by distance (default: 300)
    #[serde(default = "default_gps_interval")]
    pub gps_interval_secs: u32,

    /// Movement in meters below which the provider may skip an update (default: 1.5)
    #[serde(default = "default_min_distance")]
    pub min_distance_meters: f64,

    /// Order applied right after the file is read (default: sequential)
    #[serde(default)]
    pub initial_order: SortOrder,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            gps_interval_secs: default_gps_interval(),
            min_distance_meters: default_min_distance(),
            initial_order: SortOrder::default(),
        }
    }
}

/// Options for GeoJSON export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Add the last computed distance to the properties (default: true)
    #[serde(default = "default_true")]
    pub include_distance: bool,

    /// Export only places passing the current filter (default: true)
    #[serde(default = "default_true")]
    pub only_visible: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_distance: true,
            only_visible: true,
        }
    }
}

fn default_gps_interval() -> u32 {
    60 * 5
}

fn default_min_distance() -> f64 {
    1.5
}

fn default_true() -> bool {
    true
}
