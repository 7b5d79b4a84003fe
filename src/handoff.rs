use std::fmt::Write;

use crate::waypoint::Waypoint;

/// Notice shown when no installed app accepts any of the map URIs.
pub const NO_MAPPING_APP: &str = "No mapping app found";

/// Host side of opening a URI in another app.
pub trait IntentResolver {
    /// Whether some installed app handles `uri`.
    fn can_resolve(&self, uri: &str) -> bool;
    fn launch(&mut self, uri: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffOutcome {
    Launched(String),
    NoMappingApp,
}

impl HandoffOutcome {
    /// Short transient message for the user, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Launched(_) => None,
            Self::NoMappingApp => Some(NO_MAPPING_APP),
        }
    }
}

/// URIs for showing `place` in another app, most specific first: a labelled
/// search, turn-by-turn navigation, then a plain map.
pub fn map_uris(place: &Waypoint) -> [String; 3] {
    let label = encode_uri_component(place.name())
        .replace('(', "%28")
        .replace(')', "%29");
    [
        format!("geo:0,0?q={},{}({label})", place.lat(), place.lon()),
        format!("google.navigation:q={},{}", place.lat(), place.lon()),
        format!("geo:{},{}", place.lat(), place.lon()),
    ]
}

/// Launch the first URI some app can handle.
pub fn open_in_maps<R: IntentResolver + ?Sized>(place: &Waypoint, resolver: &mut R) -> HandoffOutcome {
    for uri in map_uris(place) {
        if resolver.can_resolve(&uri) {
            log::info!("opening {uri}");
            resolver.launch(&uri);
            return HandoffOutcome::Launched(uri);
        }
    }
    log::info!("no app resolves a map URI for '{}'", place.name());
    HandoffOutcome::NoMappingApp
}

/// Percent-encode UTF-8 bytes outside `A-Z a-z 0-9 _ - ! . ~ ' ( ) *`,
/// with uppercase hex.
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || b"_-!.~'()*".contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}
