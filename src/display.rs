use serde::Serialize;

use crate::ordering::SortOrder;
use crate::waypoint::Waypoint;

/// Subtitle shown in distance order before the first fix has arrived.
pub const LOCATING_TEXT: &str = "finding current location..";

/// Text for one list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceRow {
    pub title: String,
    pub subtitle: Option<String>,
}

/// Turns a place into whatever the host draws for one row.
pub trait RowBinder {
    type Row;

    fn bind(&self, place: &Waypoint, order: SortOrder) -> Self::Row;
}

/// Two-line row: the name, plus the distance while ordered by distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceRowBinder;

impl RowBinder for PlaceRowBinder {
    type Row = PlaceRow;

    fn bind(&self, place: &Waypoint, order: SortOrder) -> PlaceRow {
        let subtitle = match order {
            SortOrder::Distance if !place.has_distance() => Some(LOCATING_TEXT.to_string()),
            SortOrder::Distance => Some(format_distance(place.distance.trunc())),
            _ => None,
        };

        PlaceRow {
            title: place.name().to_string(),
            subtitle,
        }
    }
}

/// Format a distance in meters for display.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}
