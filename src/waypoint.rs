use std::path::Path;

use serde::{Deserialize, Serialize};

/// Label used when a point carries neither a name nor a description.
pub const PLACEHOLDER_NAME: &str = "[undefined]";

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Source document kind understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointFormat {
    Gpx,
    Kml,
}

impl WaypointFormat {
    /// Resolve the format tag handed over by the file chooser.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gpx" => Some(Self::Gpx),
            "kml" => Some(Self::Kml),
            _ => None,
        }
    }

    /// Resolve the format from a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("gpx") {
            Some(Self::Gpx)
        } else if ext.eq_ignore_ascii_case("kml") {
            Some(Self::Kml)
        } else {
            None
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Kml => "kml",
        }
    }
}

/// One reading of the device location.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

/// A named point extracted from a GPX or KML document.
///
/// Everything but `distance` is fixed at construction. `distance` stays at
/// `0.0` until the first position fix arrives, so zero doubles as "unknown".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    lat: String,
    lon: String,
    name: String,
    #[serde(rename = "sequence")]
    pub(crate) sequence_index: usize,
    #[serde(skip)]
    latitude: f64,
    #[serde(skip)]
    longitude: f64,
    /// Meters from the most recent position fix.
    pub distance: f64,
}

impl Waypoint {
    /// Build a record from the text found in the document.
    ///
    /// Returns `None` when either coordinate is blank or not in a supported
    /// degree notation; such points never make it into a list.
    pub fn new(lat: &str, lon: &str, name: Option<&str>, sequence_index: usize) -> Option<Self> {
        let lat = lat.trim();
        let lon = lon.trim();
        let latitude = parse_degrees(lat)?;
        let longitude = parse_degrees(lon)?;

        let name = match name.map(str::trim) {
            Some(n) => n.to_string(),
            None => PLACEHOLDER_NAME.to_string(),
        };

        Some(Self {
            lat: lat.to_string(),
            lon: lon.to_string(),
            name,
            sequence_index,
            latitude,
            longitude,
            distance: 0.0,
        })
    }

    /// Latitude as written in the source file (trimmed).
    pub fn lat(&self) -> &str {
        &self.lat
    }

    /// Longitude as written in the source file (trimmed).
    pub fn lon(&self) -> &str {
        &self.lon
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// True once a fix has produced a distance for this point.
    pub fn has_distance(&self) -> bool {
        self.distance != 0.0
    }

    pub fn update_distance(&mut self, fix: &Position) {
        self.distance = fix.distance_to(self.latitude, self.longitude);
    }

    /// Same place means identical coordinate text, whatever the labels say.
    pub fn same_place(&self, other: &Waypoint) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse a coordinate in `DDD.DDDDD`, `DDD:MM.MMMMM` or `DDD:MM:SS.SSSSS`
/// notation into decimal degrees.
pub fn parse_degrees(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // a sign is only allowed in front of the degrees
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let parts: Vec<&str> = body.split(':').collect();
    let value = match parts.as_slice() {
        [deg] => parse_unsigned(deg)?,
        [deg, min] => {
            let deg = parse_whole(deg)?;
            let min = parse_unsigned(min)?;
            if min >= 60.0 {
                return None;
            }
            deg + min / 60.0
        }
        [deg, min, sec] => {
            let deg = parse_whole(deg)?;
            let min = parse_whole(min)?;
            let sec = parse_unsigned(sec)?;
            if min >= 60.0 || sec >= 60.0 {
                return None;
            }
            deg + min / 60.0 + sec / 3600.0
        }
        _ => return None,
    };

    if value > 180.0 {
        return None;
    }

    Some(if negative { -value } else { value })
}

fn parse_unsigned(s: &str) -> Option<f64> {
    if s.is_empty() || s.starts_with(['-', '+']) {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_whole(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().map(f64::from)
}
