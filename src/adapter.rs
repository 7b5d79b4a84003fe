use crate::ordering::SortOrder;
use crate::waypoint::{Position, Waypoint};

/// Receives a signal whenever the visible list changed and must be redrawn.
pub trait ListObserver {
    fn on_data_set_changed(&mut self, visible_count: usize);
}

impl<F: FnMut(usize)> ListObserver for F {
    fn on_data_set_changed(&mut self, visible_count: usize) {
        self(visible_count)
    }
}

/// Owns the full place list and the filtered view shown to the user.
///
/// The filtered view is a list of positions into the full list and is always
/// re-derived after the full list changes, so it follows the current order.
/// Collaborators mutate the list only through [`apply_ordering`] and
/// [`apply_distances`].
///
/// [`apply_ordering`]: PlacesAdapter::apply_ordering
/// [`apply_distances`]: PlacesAdapter::apply_distances
pub struct PlacesAdapter {
    places: Vec<Waypoint>,
    visible: Vec<usize>,
    query: String,
    observer: Option<Box<dyn ListObserver>>,
}

impl PlacesAdapter {
    pub fn new(places: Vec<Waypoint>) -> Self {
        let visible = (0..places.len()).collect();
        Self {
            places,
            visible,
            query: String::new(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn ListObserver>) {
        self.observer = Some(observer);
    }

    /// Every place, in the current order, ignoring the filter.
    pub fn places(&self) -> &[Waypoint] {
        &self.places
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of rows currently shown.
    pub fn item_count(&self) -> usize {
        self.visible.len()
    }

    /// The place shown at `position` in the filtered view.
    pub fn get(&self, position: usize) -> Option<&Waypoint> {
        self.visible.get(position).map(|&i| &self.places[i])
    }

    pub fn visible(&self) -> impl Iterator<Item = &Waypoint> + '_ {
        self.visible.iter().map(|&i| &self.places[i])
    }

    /// Show only places whose name contains `query`, ignoring case.
    /// An empty query shows everything.
    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh();
    }

    /// Re-derive the filtered view from the full list and notify.
    pub fn refresh(&mut self) {
        self.rederive();
        self.notify();
    }

    pub fn apply_ordering(&mut self, order: SortOrder) {
        order.sort(&mut self.places);
        self.refresh();
    }

    /// Recompute every distance from `fix`, sort nearest first, then notify.
    pub fn apply_distances(&mut self, fix: &Position) {
        for place in &mut self.places {
            place.update_distance(fix);
        }
        SortOrder::Distance.sort(&mut self.places);
        self.refresh();
    }

    fn rederive(&mut self) {
        if self.query.is_empty() {
            self.visible = (0..self.places.len()).collect();
            return;
        }

        let needle = self.query.to_lowercase();
        self.visible = self
            .places
            .iter()
            .enumerate()
            .filter(|(_, p)| p.name().to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
    }

    fn notify(&mut self) {
        let count = self.visible.len();
        if let Some(observer) = self.observer.as_mut() {
            observer.on_data_set_changed(count);
        }
    }
}

impl std::fmt::Debug for PlacesAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesAdapter")
            .field("places", &self.places.len())
            .field("visible", &self.visible.len())
            .field("query", &self.query)
            .finish()
    }
}
