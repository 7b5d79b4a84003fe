use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlacesError;
use crate::waypoint::Waypoint;

/// How the place list is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Order of appearance in the source file.
    #[default]
    Sequential,
    Alphabetic,
    /// Nearest first, by the distances of the last position fix.
    Distance,
}

impl SortOrder {
    pub fn compare(self, a: &Waypoint, b: &Waypoint) -> Ordering {
        match self {
            Self::Sequential => a.sequence_index.cmp(&b.sequence_index),
            // UTF-16 code unit order, like the host platform's string compare
            Self::Alphabetic => a.name().encode_utf16().cmp(b.name().encode_utf16()),
            Self::Distance => a.distance.total_cmp(&b.distance),
        }
    }

    /// Stable in-place sort; ties keep their current relative order.
    pub fn sort(self, places: &mut [Waypoint]) {
        places.sort_by(|a, b| self.compare(a, b));
    }
}

impl FromStr for SortOrder {
    type Err = PlacesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "alphabetic" => Ok(Self::Alphabetic),
            "distance" => Ok(Self::Distance),
            other => Err(PlacesError::Options(format!("unknown sort order '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::Position;

    fn place(name: &str, lat: &str, lon: &str, index: usize) -> Waypoint {
        Waypoint::new(lat, lon, Some(name), index).unwrap()
    }

    fn names(places: &[Waypoint]) -> Vec<&str> {
        places.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_from_str() {
        assert_eq!("distance".parse::<SortOrder>().unwrap(), SortOrder::Distance);
        assert_eq!("alphabetic".parse::<SortOrder>().unwrap(), SortOrder::Alphabetic);
        assert!("Distance".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sequential_restores_file_order() {
        let mut places = vec![
            place("c", "0", "0", 2),
            place("a", "0", "0", 0),
            place("b", "0", "0", 1),
        ];
        SortOrder::Sequential.sort(&mut places);
        let indices: Vec<usize> = places.iter().map(Waypoint::sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_alphabetic_is_case_sensitive_and_stable() {
        let mut places = vec![
            place("beta", "1", "1", 0),
            place("Alpha", "2", "2", 1),
            place("alpha", "3", "3", 2),
            place("Alpha", "4", "4", 3),
            place("[undefined]", "5", "5", 4),
        ];
        SortOrder::Alphabetic.sort(&mut places);
        assert_eq!(
            names(&places),
            vec!["Alpha", "Alpha", "[undefined]", "alpha", "beta"]
        );
        // equal names keep their relative order
        assert_eq!(places[0].lat(), "2");
        assert_eq!(places[1].lat(), "4");
    }

    #[test]
    fn test_alphabetic_uses_utf16_units() {
        // U+FF21 sorts after U+1F600 by UTF-16 units but before it by code point
        let mut places = vec![place("\u{1F600}", "0", "0", 0), place("\u{FF21}", "0", "0", 1)];
        SortOrder::Alphabetic.sort(&mut places);
        assert_eq!(places[0].name(), "\u{1F600}");
    }

    #[test]
    fn test_distance_ties_keep_order() {
        let mut places = vec![
            place("first", "1", "1", 0),
            place("second", "2", "2", 1),
            place("third", "3", "3", 2),
        ];
        SortOrder::Distance.sort(&mut places);
        assert_eq!(names(&places), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_distance_nearest_first_and_idempotent() {
        let mut places = vec![
            place("far", "10.0", "10.0", 0),
            place("near", "0.1", "0.1", 1),
            place("mid", "1.0", "1.0", 2),
        ];
        let fix = Position::new(0.0, 0.0);
        places.iter_mut().for_each(|p| p.update_distance(&fix));

        SortOrder::Distance.sort(&mut places);
        assert_eq!(names(&places), vec!["near", "mid", "far"]);

        let before: Vec<usize> = places.iter().map(Waypoint::sequence_index).collect();
        SortOrder::Distance.sort(&mut places);
        let after: Vec<usize> = places.iter().map(Waypoint::sequence_index).collect();
        assert_eq!(before, after);
    }
}
