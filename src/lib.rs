pub mod adapter;
pub mod converter;
pub mod display;
pub mod error;
pub mod handoff;
#[cfg(not(target_arch = "wasm32"))]
pub mod loader;
pub mod options;
pub mod ordering;
pub mod parser;
pub mod session;
pub mod tracker;
pub mod waypoint;

use js_sys::{Function, Object, Reflect};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::PlacesError;
use crate::handoff::{HandoffOutcome, IntentResolver};
use crate::options::{ExportOptions, SessionOptions};
use crate::ordering::SortOrder;
use crate::session::PlacesSession;
use crate::tracker::LocationService;
use crate::waypoint::{Position, WaypointFormat};

/// Parse a GPX or KML document into an array of place records.
/// An unknown format or a malformed document gives an empty array.
#[wasm_bindgen(js_name = parseWaypoints)]
pub fn parse_waypoints(document: &str, format: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let places = match WaypointFormat::from_tag(format) {
        Some(format) => parser::parse_document(document, format),
        None => Vec::new(),
    };
    serde_wasm_bindgen::to_value(&places).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build the map URIs for a place, most specific first.
#[wasm_bindgen(js_name = mapUris)]
pub fn map_uris(lat: &str, lon: &str, name: Option<String>) -> Result<Vec<String>, JsValue> {
    let place = waypoint::Waypoint::new(lat, lon, name.as_deref(), 0)
        .ok_or_else(|| JsValue::from_str("invalid coordinates"))?;
    Ok(handoff::map_uris(&place).to_vec())
}

/// Host object with `isLocationEnabled()`, `isProviderEnabled()`,
/// `requestUpdates(intervalSecs, minDistanceMeters)`, `removeUpdates()` and
/// `requestSingleUpdate()`. Missing methods count as disabled / no-ops.
struct JsLocationService {
    host: Object,
}

impl LocationService for JsLocationService {
    fn is_location_enabled(&self) -> bool {
        call_host(&self.host, "isLocationEnabled", &[])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn is_provider_enabled(&self) -> bool {
        call_host(&self.host, "isProviderEnabled", &[])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn request_updates(&mut self, interval_secs: u32, min_distance_meters: f64) {
        call_host(
            &self.host,
            "requestUpdates",
            &[interval_secs.into(), min_distance_meters.into()],
        );
    }

    fn remove_updates(&mut self) {
        call_host(&self.host, "removeUpdates", &[]);
    }

    fn request_single_update(&mut self) {
        call_host(&self.host, "requestSingleUpdate", &[]);
    }
}

/// Host object with `canResolve(uri)` and `launch(uri)`.
struct JsIntentResolver {
    host: Object,
}

impl IntentResolver for JsIntentResolver {
    fn can_resolve(&self, uri: &str) -> bool {
        call_host(&self.host, "canResolve", &[uri.into()])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn launch(&mut self, uri: &str) {
        call_host(&self.host, "launch", &[uri.into()]);
    }
}

fn call_host(host: &Object, method: &str, args: &[JsValue]) -> Option<JsValue> {
    let func = Reflect::get(host, &JsValue::from_str(method))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    let result = match args {
        [] => func.call0(host),
        [a] => func.call1(host, a),
        [a, b] => func.call2(host, a, b),
        _ => func.apply(host, &args.iter().collect()),
    };
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("host method {method} threw: {e:?}");
            None
        }
    }
}

/// A place list bound to the host's location service.
#[wasm_bindgen(js_name = PlacesSession)]
pub struct JsPlacesSession {
    inner: PlacesSession<JsLocationService>,
}

#[wasm_bindgen(js_class = PlacesSession)]
impl JsPlacesSession {
    #[wasm_bindgen(constructor)]
    pub fn new(
        document: &str,
        format: &str,
        location: Object,
        options: JsValue,
    ) -> Result<JsPlacesSession, JsValue> {
        console_error_panic_hook::set_once();

        let opts: SessionOptions = parse_options(options)?;
        let service = JsLocationService { host: location };
        let places = match WaypointFormat::from_tag(format) {
            Some(format) => parser::parse_document(document, format),
            None => Vec::new(),
        };
        Ok(Self {
            inner: PlacesSession::new(places, service, opts),
        })
    }

    /// `callback(visibleCount)` runs after every change of the visible list.
    #[wasm_bindgen(js_name = setObserver)]
    pub fn set_observer(&mut self, callback: Function) {
        self.inner.set_observer(Box::new(move |count: usize| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(count as u32)) {
                log::warn!("list observer threw: {e:?}");
            }
        }));
    }

    #[wasm_bindgen(js_name = sortOrder)]
    pub fn sort_order(&self) -> String {
        match self.inner.sort_order() {
            SortOrder::Sequential => "sequential",
            SortOrder::Alphabetic => "alphabetic",
            SortOrder::Distance => "distance",
        }
        .to_string()
    }

    /// One of "sequential", "alphabetic" or "distance".
    #[wasm_bindgen(js_name = setSortOrder)]
    pub fn set_sort_order(&mut self, order: &str) -> Result<(), JsValue> {
        let order: SortOrder = order.parse()?;
        self.inner.set_sort_order(order);
        Ok(())
    }

    pub fn pause(&mut self) {
        self.inner.pause();
    }

    pub fn resume(&mut self) {
        self.inner.resume();
    }

    #[wasm_bindgen(js_name = refreshLocation)]
    pub fn refresh_location(&mut self) {
        self.inner.refresh_location();
    }

    #[wasm_bindgen(js_name = onPositionFix)]
    pub fn on_position_fix(&mut self, latitude: f64, longitude: f64) {
        self.inner.on_position_fix(Position::new(latitude, longitude));
    }

    pub fn filter(&mut self, query: &str) {
        self.inner.filter(query);
    }

    #[wasm_bindgen(js_name = itemCount)]
    pub fn item_count(&self) -> usize {
        self.inner.adapter().item_count()
    }

    /// Rows `{ title, subtitle }` for the visible places.
    pub fn rows(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.rows())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Open the visible place at `position` in a map app. Returns the notice
    /// to show the user, if any. Throws when no row exists at `position`.
    #[wasm_bindgen(js_name = openPlace)]
    pub fn open_place(&self, position: usize, resolver: Object) -> Result<Option<String>, JsValue> {
        let mut resolver = JsIntentResolver { host: resolver };
        let outcome = self.inner.open_place(position, &mut resolver).ok_or_else(|| {
            JsValue::from_str(&format!(
                "no place at position {position} of {}",
                self.inner.adapter().item_count()
            ))
        })?;
        Ok(match outcome {
            HandoffOutcome::Launched(_) => None,
            outcome => outcome.notice().map(str::to_string),
        })
    }

    #[wasm_bindgen(js_name = toGeoJsonString)]
    pub fn to_geojson_string(&self, options: JsValue) -> Result<String, JsValue> {
        let opts: ExportOptions = parse_options(options)?;
        let fc = self.inner.to_feature_collection(&opts);
        serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn parse_options<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| PlacesError::Options(e.to_string()).into())
    }
}
