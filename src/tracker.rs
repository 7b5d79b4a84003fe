use crate::adapter::PlacesAdapter;
use crate::waypoint::Position;

/// Device location source, implemented by the host.
///
/// Fixes requested here are delivered back through
/// [`DistanceTracker::on_position_fix`] (or the session wrapping it), one at a
/// time.
pub trait LocationService {
    /// Device-wide location switch.
    fn is_location_enabled(&self) -> bool;
    /// The specific provider used for fixes (GPS).
    fn is_provider_enabled(&self) -> bool;
    fn request_updates(&mut self, interval_secs: u32, min_distance_meters: f64);
    fn remove_updates(&mut self);
    fn request_single_update(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Tracking { interval_secs: u32 },
}

/// Keeps the distances of a place list current while distance ordering is
/// active.
#[derive(Debug)]
pub struct DistanceTracker<L> {
    service: L,
    state: TrackerState,
    min_distance_meters: f64,
}

impl<L: LocationService> DistanceTracker<L> {
    pub fn new(service: L, min_distance_meters: f64) -> Self {
        Self {
            service,
            state: TrackerState::Idle,
            min_distance_meters,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    pub fn service(&self) -> &L {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut L {
        &mut self.service
    }

    /// Subscribe to periodic fixes. Asking again for the current interval
    /// does nothing; a zero interval stops tracking.
    pub fn set_interval(&mut self, interval_secs: u32) {
        if self.state == (TrackerState::Tracking { interval_secs }) {
            return;
        }
        self.clear_interval();

        if interval_secs == 0 || !self.location_available() {
            return;
        }

        log::debug!("tracking position every {interval_secs}s");
        self.service
            .request_updates(interval_secs, self.min_distance_meters);
        self.state = TrackerState::Tracking { interval_secs };
    }

    pub fn clear_interval(&mut self) {
        if self.is_tracking() {
            log::debug!("position tracking stopped");
            self.service.remove_updates();
            self.state = TrackerState::Idle;
        }
    }

    /// Ask for one fix now. Ignored while a periodic subscription is active.
    pub fn refresh(&mut self) {
        if self.is_tracking() {
            log::debug!("refresh ignored while tracking");
            return;
        }
        if !self.location_available() {
            return;
        }
        self.service.request_single_update();
    }

    /// Apply a fix: recompute distances, re-sort by distance and notify.
    pub fn on_position_fix(&self, fix: &Position, adapter: &mut PlacesAdapter) {
        log::trace!("position fix {:.6},{:.6}", fix.latitude, fix.longitude);
        adapter.apply_distances(fix);
    }

    fn location_available(&self) -> bool {
        if !self.service.is_location_enabled() {
            log::debug!("location is disabled");
            return false;
        }
        if !self.service.is_provider_enabled() {
            log::debug!("location provider is disabled");
            return false;
        }
        true
    }
}
