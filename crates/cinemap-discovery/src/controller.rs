//! Map screen interaction model.
//!
//! The controller tracks the settled viewport and the origin of the last
//! completed search, raises `has_moved_significantly` once the user pans
//! farther than the re-search threshold, and applies discovery results only
//! for the most recent search ticket so that a slow, superseded search never
//! overwrites a newer one.

use std::sync::Arc;

use cinemap_core::{AppConfig, Coordinate, Review, Theatre, Viewport};

use crate::discovery::{Discovery, DiscoveryOutcome, ResultSource};
use crate::location::{LocationSource, LocationWarning, DEFAULT_REGION};

/// Span used when zooming onto a selected theatre.
const SELECTED_SPAN_DEGREES: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub radius_meters: u32,
    /// Pan distance from the last search origin that offers "search this area".
    pub research_threshold_meters: f64,
    pub default_center: Coordinate,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            radius_meters: 10_000,
            research_threshold_meters: 2_000.0,
            default_center: DEFAULT_REGION,
        }
    }
}

impl ControllerOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            radius_meters: config.search_radius_meters,
            research_threshold_meters: config.research_threshold_meters,
            default_center: DEFAULT_REGION,
        }
    }
}

/// Identifies one issued search. Only the latest ticket may apply results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchTicket {
    generation: u64,
    origin: Coordinate,
}

impl SearchTicket {
    #[must_use]
    pub fn origin(&self) -> Coordinate {
        self.origin
    }
}

pub struct MapController {
    discovery: Arc<Discovery>,
    location: Arc<dyn LocationSource>,
    options: ControllerOptions,
    viewport: Viewport,
    last_search_origin: Option<Coordinate>,
    has_moved_significantly: bool,
    theatres: Vec<Theatre>,
    last_source: Option<ResultSource>,
    selected: Option<String>,
    detail_open: bool,
    warning: Option<LocationWarning>,
    generation: u64,
    in_flight: Option<u64>,
}

impl MapController {
    #[must_use]
    pub fn new(
        discovery: Arc<Discovery>,
        location: Arc<dyn LocationSource>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            discovery,
            location,
            viewport: Viewport::around(options.default_center),
            options,
            last_search_origin: None,
            has_moved_significantly: false,
            theatres: Vec::new(),
            last_source: None,
            selected: None,
            detail_open: false,
            warning: None,
            generation: 0,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn theatres(&self) -> &[Theatre] {
        &self.theatres
    }

    #[must_use]
    pub fn last_search_origin(&self) -> Option<Coordinate> {
        self.last_search_origin
    }

    #[must_use]
    pub fn last_source(&self) -> Option<ResultSource> {
        self.last_source
    }

    /// Whether the UI should offer "search this area".
    #[must_use]
    pub fn has_moved_significantly(&self) -> bool {
        self.has_moved_significantly
    }

    #[must_use]
    pub fn warning(&self) -> Option<&LocationWarning> {
        self.warning.as_ref()
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn detail_open(&self) -> bool {
        self.detail_open
    }

    #[must_use]
    pub fn selected_theatre(&self) -> Option<&Theatre> {
        let id = self.selected.as_deref()?;
        self.theatres.iter().find(|t| t.id == id)
    }

    /// Records a settled viewport and returns the updated
    /// `has_moved_significantly` flag. Before the first search there is
    /// nothing to compare against and the flag stays down.
    pub fn on_viewport_settled(&mut self, viewport: Viewport) -> bool {
        self.viewport = viewport;
        self.has_moved_significantly = self.moved_from_last_search();
        self.has_moved_significantly
    }

    /// Issues a ticket for a search from `origin`, superseding any search
    /// still in flight.
    pub fn begin_search(&mut self, origin: Coordinate) -> SearchTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        SearchTicket {
            generation: self.generation,
            origin,
        }
    }

    /// Applies `outcome` if `ticket` is still the latest search. Returns
    /// `false` and leaves state untouched for a superseded ticket.
    pub fn apply_results(&mut self, ticket: SearchTicket, outcome: DiscoveryOutcome) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded search results"
            );
            return false;
        }

        self.in_flight = None;
        self.last_search_origin = Some(ticket.origin);
        self.last_source = Some(outcome.source);
        self.theatres = outcome.theatres;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.theatres.iter().any(|t| t.id == id))
        {
            self.selected = None;
            self.detail_open = false;
        }
        self.has_moved_significantly = self.moved_from_last_search();
        true
    }

    /// Searches around the current viewport center. Refused (returns
    /// `false`) while another search is in flight.
    pub async fn search_this_area(&mut self) -> bool {
        if self.is_searching() {
            tracing::debug!("search already in flight, ignoring search-this-area");
            return false;
        }
        let origin = self.viewport.center;
        self.run_search(origin).await
    }

    /// Re-centers on the device position and always runs a fresh search.
    ///
    /// When the position cannot be read the controller records a
    /// [`LocationWarning`] and searches the default region instead.
    pub async fn use_my_location(&mut self) -> bool {
        let origin = match self.location.current_position().await {
            Ok(position) => {
                self.warning = None;
                position
            }
            Err(reason) => {
                tracing::warn!(error = %reason, "device location unavailable, using default region");
                let fallback = self.options.default_center;
                self.warning = Some(LocationWarning { reason, fallback });
                fallback
            }
        };

        self.viewport = Viewport::around(origin);
        self.run_search(origin).await
    }

    /// Opens the detail surface for `theatre_id` and zooms onto it. Does not
    /// search.
    pub fn select_theatre(&mut self, theatre_id: &str) -> Option<&Theatre> {
        let location = self
            .theatres
            .iter()
            .find(|t| t.id == theatre_id)
            .map(|t| t.location)?;
        self.viewport =
            Viewport::with_span(location, SELECTED_SPAN_DEGREES, SELECTED_SPAN_DEGREES);
        self.selected = Some(theatre_id.to_owned());
        self.detail_open = true;
        self.selected_theatre()
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
    }

    /// Appends a user review to the local copy of `theatre_id`. Nothing is
    /// persisted until [`MapController::commit_theatre`].
    pub fn add_review(&mut self, theatre_id: &str, review: Review) -> bool {
        match self.theatres.iter_mut().find(|t| t.id == theatre_id) {
            Some(theatre) => {
                theatre.reviews.push(review);
                true
            }
            None => false,
        }
    }

    /// Appends a photo URI to the local copy of `theatre_id`.
    pub fn add_photo(&mut self, theatre_id: &str, uri: impl Into<String>) -> bool {
        match self.theatres.iter_mut().find(|t| t.id == theatre_id) {
            Some(theatre) => {
                theatre.photos.push(uri.into());
                true
            }
            None => false,
        }
    }

    /// Writes the local copy of `theatre_id` back to the cache. Returns the
    /// number of cached slots updated; zero when the theatre is unknown or
    /// not cached (static fallback results are never cached).
    pub async fn commit_theatre(&self, theatre_id: &str) -> usize {
        match self.theatres.iter().find(|t| t.id == theatre_id) {
            Some(theatre) => self.discovery.write_back(theatre).await,
            None => 0,
        }
    }

    async fn run_search(&mut self, origin: Coordinate) -> bool {
        let ticket = self.begin_search(origin);
        let outcome = self
            .discovery
            .discover(origin, self.options.radius_meters)
            .await;
        self.apply_results(ticket, outcome)
    }

    fn moved_from_last_search(&self) -> bool {
        self.last_search_origin.is_some_and(|origin| {
            self.viewport.center.distance_to(&origin) > self.options.research_threshold_meters
        })
    }
}
