//! Route selection and recent-route history
//!
//! Users track up to five routes at a time. Each tracked route is drawn in a
//! color taken from a fixed palette by its position in the selection, so the
//! colors can always be re-derived from the persisted list of route ids.
//! Removing an earlier route shifts the colors of the routes after it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::store::{Settings, StoreResult};

/// Maximum number of routes tracked at once
pub const MAX_SELECTED_ROUTES: usize = 5;

/// Maximum number of entries in the recent-route history
pub const MAX_RECENT_ROUTES: usize = 5;

/// Display color of a tracked route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteColor {
    Red,
    Blue,
    Green,
    Orange,
    Purple,
}

/// Colors in assignment order
pub const PALETTE: [RouteColor; MAX_SELECTED_ROUTES] = [
    RouteColor::Red,
    RouteColor::Blue,
    RouteColor::Green,
    RouteColor::Orange,
    RouteColor::Purple,
];

impl RouteColor {
    pub fn name(self) -> &'static str {
        match self {
            RouteColor::Red => "red",
            RouteColor::Blue => "blue",
            RouteColor::Green => "green",
            RouteColor::Orange => "orange",
            RouteColor::Purple => "purple",
        }
    }

    /// RGB hex value for map renderers
    pub fn hex(self) -> &'static str {
        match self {
            RouteColor::Red => "#FF3B30",
            RouteColor::Blue => "#007AFF",
            RouteColor::Green => "#34C759",
            RouteColor::Orange => "#FF9500",
            RouteColor::Purple => "#AF52DE",
        }
    }
}

impl fmt::Display for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assigns palette colors to route ids by their position in the selection
pub fn assign_colors(route_ids: &[i64]) -> Vec<(i64, RouteColor)> {
    route_ids
        .iter()
        .copied()
        .zip(PALETTE.iter().copied().cycle())
        .collect()
}

/// Snapshot of everything the selection manager persists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_city_id: Option<i64>,
    pub selected_route_ids: Vec<i64>,
    /// Most recent first, unique
    pub recent_route_numbers: Vec<String>,
}

/// Result of toggling a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The route was added and drawn in this color
    Selected(RouteColor),
    /// The route was removed from the selection
    Deselected,
    /// The selection is full; nothing changed
    SelectionFull,
}

/// Tracks selected routes and the recent-route history
///
/// Every change is written through to the store before it becomes visible.
pub struct SelectionManager {
    settings: Settings,
    state: SelectionState,
}

impl SelectionManager {
    /// Loads the persisted selection
    pub fn load(settings: Settings) -> Self {
        let state = read_state(&settings);
        Self { settings, state }
    }

    /// Re-reads the persisted selection, discarding the in-memory copy
    pub fn reload(&mut self) {
        self.state = read_state(&self.settings);
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_route_ids(&self) -> &[i64] {
        &self.state.selected_route_ids
    }

    pub fn recent_route_numbers(&self) -> &[String] {
        &self.state.recent_route_numbers
    }

    pub fn is_selected(&self, route_id: i64) -> bool {
        self.state.selected_route_ids.contains(&route_id)
    }

    pub fn is_full(&self) -> bool {
        self.state.selected_route_ids.len() >= MAX_SELECTED_ROUTES
    }

    /// Selects or deselects a route and records its number in the history
    ///
    /// Adding to a full selection is a no-op reported as `SelectionFull`.
    /// If persisting the history fails, the stored selection is rolled back
    /// and the in-memory state is left unchanged.
    pub fn toggle(&mut self, route_id: i64, route_number: &str) -> StoreResult<ToggleOutcome> {
        let mut selected = self.state.selected_route_ids.clone();

        let outcome = if let Some(index) = selected.iter().position(|&id| id == route_id) {
            selected.remove(index);
            ToggleOutcome::Deselected
        } else if selected.len() >= MAX_SELECTED_ROUTES {
            debug!(route_id, "selection full, ignoring toggle");
            return Ok(ToggleOutcome::SelectionFull);
        } else {
            selected.push(route_id);
            ToggleOutcome::Selected(PALETTE[(selected.len() - 1) % PALETTE.len()])
        };

        let mut recent = self.state.recent_route_numbers.clone();
        push_recent(&mut recent, route_number);

        self.settings.set_selected_route_ids(&selected)?;
        if let Err(e) = self.settings.set_recent_routes(&recent) {
            if let Err(rollback) = self
                .settings
                .set_selected_route_ids(&self.state.selected_route_ids)
            {
                warn!(route_id, error = %rollback, "failed to restore previous selection");
            }
            return Err(e);
        }

        debug!(route_id, ?outcome, "selection updated");
        self.state.selected_route_ids = selected;
        self.state.recent_route_numbers = recent;
        Ok(outcome)
    }

    /// Color of a selected route, derived from its position in the selection
    pub fn color_for(&self, route_id: i64) -> Option<RouteColor> {
        self.state
            .selected_route_ids
            .iter()
            .position(|&id| id == route_id)
            .map(|index| PALETTE[index % PALETTE.len()])
    }

    /// Re-derives the color of every selected route, in selection order
    pub fn restore(&self) -> Vec<(i64, RouteColor)> {
        assign_colors(&self.state.selected_route_ids)
    }

    /// Deselects every route; the history is kept
    pub fn clear(&mut self) -> StoreResult<()> {
        self.settings.set_selected_route_ids(&[])?;
        self.state.selected_route_ids.clear();
        Ok(())
    }
}

/// Reads the persisted selection, restoring its invariants if the stored
/// lists were edited by hand
fn read_state(settings: &Settings) -> SelectionState {
    let mut selected_route_ids = Vec::new();
    for id in settings.selected_route_ids() {
        if !selected_route_ids.contains(&id) {
            selected_route_ids.push(id);
        }
    }
    selected_route_ids.truncate(MAX_SELECTED_ROUTES);

    let mut recent_route_numbers: Vec<String> = Vec::new();
    for number in settings.recent_routes() {
        if !recent_route_numbers.contains(&number) {
            recent_route_numbers.push(number);
        }
    }
    recent_route_numbers.truncate(MAX_RECENT_ROUTES);

    SelectionState {
        selected_city_id: settings.selected_city_id(),
        selected_route_ids,
        recent_route_numbers,
    }
}

/// Moves `number` to the front of the history and trims it
fn push_recent(history: &mut Vec<String>, number: &str) {
    history.retain(|existing| existing != number);
    history.insert(0, number.to_string());
    history.truncate(MAX_RECENT_ROUTES);
}
