//! Selection state behind the visitors chart.
//!
//! Every change goes through [`ChartState::apply`], which returns the side
//! effects the caller must perform (start a fetch, rewrite the shareable
//! URL). Responses are matched against the latest issued ticket so a late
//! answer to a superseded request never replaces newer data.

use tracing::debug;

use crate::domain::{DailyVisitors, TimeRange};

/// Sequence number of an issued fetch
pub type Ticket = u64;

/// Coarse width class of the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    Narrow,
    #[default]
    Wide,
}

impl Viewport {
    /// Anything narrower than this is treated as a phone
    pub const MOBILE_BREAKPOINT_PX: u32 = 768;

    pub fn from_width(px: u32) -> Self {
        if px < Self::MOBILE_BREAKPOINT_PX {
            Viewport::Narrow
        } else {
            Viewport::Wide
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub range: TimeRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select(TimeRange),
    ViewportChanged(Viewport),
    Loaded {
        ticket: Ticket,
        series: Vec<DailyVisitors>,
    },
    Abandon(Ticket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Fetch(FetchRequest),
    /// The selection was changed without user input and the shareable
    /// location must be rewritten to match
    ReplaceRange(TimeRange),
}

/// What the chart area should show right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartView<'a> {
    /// Nothing has ever been loaded
    Skeleton,
    /// A load finished with no rows
    Empty,
    Chart(&'a [DailyVisitors]),
}

#[derive(Debug, Clone)]
pub struct ChartState {
    selected: TimeRange,
    series: Option<Vec<DailyVisitors>>,
    in_flight: Option<Ticket>,
    viewport: Viewport,
    last_ticket: Ticket,
}

impl Default for ChartState {
    fn default() -> Self {
        Self::new(TimeRange::DEFAULT)
    }
}

impl ChartState {
    pub fn new(selected: TimeRange) -> Self {
        Self {
            selected,
            series: None,
            in_flight: None,
            viewport: Viewport::default(),
            last_ticket: 0,
        }
    }

    /// State hydrated with a series rendered on the server
    pub fn with_series(selected: TimeRange, series: Vec<DailyVisitors>) -> Self {
        Self {
            series: Some(series),
            ..Self::new(selected)
        }
    }

    pub fn selected(&self) -> TimeRange {
        self.selected
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn series(&self) -> Option<&[DailyVisitors]> {
        self.series.as_deref()
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Old data is on screen while a newer request runs
    pub fn is_refreshing(&self) -> bool {
        self.is_pending() && self.series.is_some()
    }

    /// The skeleton only shows while nothing has loaded and a fetch is
    /// still owed; once the last request was given up the card goes empty.
    pub fn view(&self) -> ChartView<'_> {
        match self.series.as_deref() {
            None if self.in_flight.is_none() && self.last_ticket > 0 => ChartView::Empty,
            None => ChartView::Skeleton,
            Some([]) => ChartView::Empty,
            Some(series) => ChartView::Chart(series),
        }
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Select(range) => self.select(range).map(Effect::Fetch).into_iter().collect(),
            Action::ViewportChanged(viewport) => self.viewport_changed(viewport),
            Action::Loaded { ticket, series } => {
                self.loaded(ticket, series);
                Vec::new()
            }
            Action::Abandon(ticket) => {
                self.abandon(ticket);
                Vec::new()
            }
        }
    }

    fn select(&mut self, range: TimeRange) -> Option<FetchRequest> {
        let unchanged = range == self.selected;
        let nothing_to_wait_for = self.series.is_none() && self.in_flight.is_none();
        if unchanged && !nothing_to_wait_for {
            return None;
        }

        self.selected = range;
        Some(self.issue())
    }

    fn viewport_changed(&mut self, viewport: Viewport) -> Vec<Effect> {
        self.viewport = viewport;
        if viewport == Viewport::Wide || self.selected == TimeRange::SHORTEST {
            return Vec::new();
        }

        debug!(
            from = self.selected.as_str(),
            "Narrow viewport, forcing {}",
            TimeRange::SHORTEST
        );
        self.selected = TimeRange::SHORTEST;
        let request = self.issue();
        vec![
            Effect::ReplaceRange(TimeRange::SHORTEST),
            Effect::Fetch(request),
        ]
    }

    fn issue(&mut self) -> FetchRequest {
        self.last_ticket += 1;
        self.in_flight = Some(self.last_ticket);
        FetchRequest {
            ticket: self.last_ticket,
            range: self.selected,
        }
    }

    fn loaded(&mut self, ticket: Ticket, series: Vec<DailyVisitors>) {
        if ticket != self.last_ticket {
            debug!(ticket, latest = self.last_ticket, "Dropping stale response");
            return;
        }
        self.series = Some(series);
        self.in_flight = None;
    }

    fn abandon(&mut self, ticket: Ticket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }
}
