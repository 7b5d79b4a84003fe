use std::path::Path;

use geojson::FeatureCollection;

use crate::adapter::{ListObserver, PlacesAdapter};
use crate::converter;
use crate::display::{PlaceRow, PlaceRowBinder, RowBinder};
use crate::handoff::{self, HandoffOutcome, IntentResolver};
use crate::options::{ExportOptions, SessionOptions};
use crate::ordering::SortOrder;
use crate::parser;
use crate::tracker::{DistanceTracker, LocationService};
use crate::waypoint::{Position, Waypoint, WaypointFormat};

/// One file-viewing session: the place list, its order and filter, and the
/// position tracking that keeps distance order current.
///
/// All mutation goes through `&mut self`, so a position fix is applied
/// (distances, sort, filter, notify) before anything else can touch the list.
#[derive(Debug)]
pub struct PlacesSession<L> {
    title: String,
    adapter: PlacesAdapter,
    tracker: DistanceTracker<L>,
    order: SortOrder,
    options: SessionOptions,
}

impl<L: LocationService> PlacesSession<L> {
    pub fn new(places: Vec<Waypoint>, service: L, options: SessionOptions) -> Self {
        let mut places = places;
        let order = options.initial_order;
        order.sort(&mut places);

        Self {
            title: String::new(),
            adapter: PlacesAdapter::new(places),
            tracker: DistanceTracker::new(service, options.min_distance_meters),
            order,
            options,
        }
    }

    /// Read `path` as `format_tag` ("gpx" or "kml"). An unreadable file gives
    /// an empty session rather than an error.
    pub fn open(path: &Path, format_tag: &str, service: L, options: SessionOptions) -> Self {
        let places = parser::waypoints_from_file(path, format_tag);
        log::info!("{} places read from {}", places.len(), path.display());

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(places, service, options).with_title(title)
    }

    pub fn from_document(xml: &str, format: WaypointFormat, service: L, options: SessionOptions) -> Self {
        Self::new(parser::parse_document(xml, format), service, options)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn adapter(&self) -> &PlacesAdapter {
        &self.adapter
    }

    pub fn tracker(&self) -> &DistanceTracker<L> {
        &self.tracker
    }

    pub fn set_observer(&mut self, observer: Box<dyn ListObserver>) {
        self.adapter.set_observer(observer);
    }

    /// Switch ordering. Distance order sorts on the distances known so far
    /// and starts tracking; any other order stops it.
    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.order = order;
        match order {
            SortOrder::Sequential | SortOrder::Alphabetic => {
                self.tracker.clear_interval();
                self.adapter.apply_ordering(order);
            }
            SortOrder::Distance => {
                self.adapter.apply_ordering(order);
                self.tracker.set_interval(self.options.gps_interval_secs);
            }
        }
    }

    /// The hosting view went to the background.
    pub fn pause(&mut self) {
        self.tracker.clear_interval();
    }

    pub fn resume(&mut self) {
        if self.order == SortOrder::Distance {
            self.tracker.set_interval(self.options.gps_interval_secs);
        }
    }

    /// Ask for a single fix; only meaningful in distance order.
    pub fn refresh_location(&mut self) {
        if self.order == SortOrder::Distance {
            self.tracker.refresh();
        }
    }

    /// Deliver a fix from the location service.
    pub fn on_position_fix(&mut self, fix: Position) {
        if self.order != SortOrder::Distance {
            log::debug!("dropping position fix outside distance order");
            return;
        }
        if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
            log::debug!("dropping non-finite position fix {fix:?}");
            return;
        }
        self.tracker.on_position_fix(&fix, &mut self.adapter);
    }

    pub fn filter(&mut self, query: &str) {
        self.adapter.filter(query);
    }

    /// Rows for the visible places, in display order.
    pub fn rows(&self) -> Vec<PlaceRow> {
        self.rows_with(&PlaceRowBinder)
    }

    pub fn rows_with<B: RowBinder>(&self, binder: &B) -> Vec<B::Row> {
        self.adapter
            .visible()
            .map(|place| binder.bind(place, self.order))
            .collect()
    }

    /// Hand the place at `position` of the visible list to a map app.
    /// `None` if there is no such row.
    pub fn open_place<R: IntentResolver + ?Sized>(
        &self,
        position: usize,
        resolver: &mut R,
    ) -> Option<HandoffOutcome> {
        let place = self.adapter.get(position)?;
        Some(handoff::open_in_maps(place, resolver))
    }

    pub fn to_feature_collection(&self, opts: &ExportOptions) -> FeatureCollection {
        if opts.only_visible {
            converter::to_feature_collection(self.adapter.visible(), opts)
        } else {
            converter::to_feature_collection(self.adapter.places(), opts)
        }
    }
}
