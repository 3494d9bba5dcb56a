//! Command runner for the Infobus client
//!
//! `App` owns the API client, the persisted settings, the route/station cache
//! and the route selection, and executes one CLI command against them,
//! writing human-readable output to the given writer.

use chrono::Local;
use futures::future::join_all;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheCoordinator;
use crate::cli::Command;
use crate::config::Config;
use crate::data::{
    ordered_route_stops, sort_predictions, visible_buses, ApiError, Bus, Prediction, Route,
    TransitApi, TransitClient,
};
use crate::error::{AppError, AppResult};
use crate::overlay::{camera_center, route_overlays};
use crate::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use crate::selection::{SelectionManager, ToggleOutcome};
use crate::store::{FileStore, Settings};

/// Main application struct wiring the services together
pub struct App {
    api: Arc<dyn TransitApi>,
    settings: Settings,
    cache: CacheCoordinator,
    selection: SelectionManager,
}

impl App {
    /// Creates the application from runtime configuration
    ///
    /// # Errors
    /// * `AppError::Api` if the API URL is not a usable http(s) base URL
    /// * `AppError::NoDataDir` if no data directory was given and the
    ///   platform default cannot be determined
    pub fn new(config: &Config) -> AppResult<Self> {
        let api = TransitClient::new(&config.api_url)?;
        let store = match &config.data_dir {
            Some(dir) => FileStore::with_dir(dir.clone()),
            None => FileStore::new().ok_or(AppError::NoDataDir)?,
        };
        debug!(api_url = %config.api_url, data_dir = %store.dir().display(), "starting");
        Ok(Self::with_services(Arc::new(api), store))
    }

    /// Creates the application around an existing API implementation
    pub fn with_services(api: Arc<dyn TransitApi>, store: FileStore) -> Self {
        let settings = Settings::new(store);
        let cache = CacheCoordinator::new(Arc::clone(&api), settings.clone());
        let selection = SelectionManager::load(settings.clone());
        Self {
            api,
            settings,
            cache,
            selection,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &CacheCoordinator {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// Executes a single command
    pub async fn run<W: Write>(&mut self, command: Command, out: &mut W) -> AppResult<()> {
        match command {
            Command::Regions => self.regions(out).await,
            Command::Cities { region } => self.cities(region, out).await,
            Command::SelectRegion { region_id } => {
                self.settings.set_selected_region_id(region_id)?;
                writeln!(out, "Selected region {}", region_id)?;
                Ok(())
            }
            Command::SelectCity { city_id } => {
                self.cache.select_city(city_id)?;
                self.selection.reload();
                writeln!(out, "Selected city {}", city_id)?;
                Ok(())
            }
            Command::City => self.city(out).await,
            Command::Routes { refresh } => self.routes(refresh, out).await,
            Command::Stations { refresh } => self.stations(refresh, out).await,
            Command::RouteStops { route_id, reverse } => {
                self.route_stops(route_id, reverse, out).await
            }
            Command::Toggle { route_id } => self.toggle(route_id, out).await,
            Command::Selection => self.show_selection(out),
            Command::ClearSelection => {
                self.selection.clear()?;
                writeln!(out, "Cleared route selection")?;
                Ok(())
            }
            Command::Map => self.map(out).await,
            Command::Buses { route_id, watch } => match watch {
                Some(seconds) => self.watch_buses(route_id, seconds, out).await,
                None => self.buses(route_id, out).await,
            },
            Command::Arrivals { station_id } => self.arrivals(station_id, out).await,
            Command::Accessible { enabled } => {
                self.settings.set_only_accessible_buses(enabled)?;
                let state = if enabled { "on" } else { "off" };
                writeln!(out, "Accessible buses only: {}", state)?;
                Ok(())
            }
            Command::AppCode => {
                writeln!(out, "{}", self.settings.app_code()?)?;
                Ok(())
            }
        }
    }

    fn selected_city(&self) -> AppResult<i64> {
        self.settings
            .selected_city_id()
            .ok_or(AppError::NoCitySelected)
    }

    /// Route numbers keyed by route id, from the cache only
    fn known_route_numbers(&self, city_id: i64) -> HashMap<i64, String> {
        self.cache
            .cached_routes_entry()
            .filter(|entry| entry.city_id == city_id)
            .map(|entry| route_numbers(&entry.items))
            .unwrap_or_default()
    }

    async fn regions<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let regions = self.api.regions().await?;
        let selected = self.settings.selected_region_id();
        for region in &regions {
            writeln!(
                out,
                "{} {:>4}  {} ({})",
                marker(selected == Some(region.id)),
                region.id,
                region.name,
                region.code
            )?;
        }
        Ok(())
    }

    async fn cities<W: Write>(&self, region: Option<i64>, out: &mut W) -> AppResult<()> {
        let region_id = region
            .or_else(|| self.settings.selected_region_id())
            .ok_or(AppError::NoRegionSelected)?;
        let cities = self.api.cities(region_id).await?;
        let selected = self.settings.selected_city_id();
        for city in &cities {
            writeln!(
                out,
                "{} {:>4}  {}",
                marker(selected == Some(city.id)),
                city.id,
                city.name
            )?;
        }
        Ok(())
    }

    async fn city<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let city = self.api.city(city_id).await?;
        writeln!(out, "{} (#{})", city.name, city.id)?;
        writeln!(out, "Center: {:.5}, {:.5}", city.lat, city.lon)?;
        writeln!(out, "Zoom: {}", city.zoom)?;
        if !city.map_layers.is_empty() {
            writeln!(out, "Layers: {}", city.map_layers.join(", "))?;
        }
        if city.display_message && !city.message.is_empty() {
            writeln!(out, "Notice: {}", city.message)?;
        }
        Ok(())
    }

    async fn routes<W: Write>(&self, refresh: bool, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        if refresh {
            self.cache.invalidate()?;
        }
        let routes = self.cache.routes(city_id).await?;
        for route in &routes {
            let color = self
                .selection
                .color_for(route.id)
                .map(|color| format!("  [{}]", color))
                .unwrap_or_default();
            writeln!(
                out,
                "{:>6}  {:>5}  {}  ({} buses){}",
                route.id, route.number, route.name, route.bus_count, color
            )?;
        }
        writeln!(out, "{} routes", routes.len())?;
        Ok(())
    }

    async fn stations<W: Write>(&self, refresh: bool, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        if refresh {
            self.cache.invalidate()?;
        }
        let stations = self.cache.stations(city_id).await?;
        for station in &stations {
            if station.description.is_empty() {
                writeln!(out, "{:>6}  {}", station.id, station.name)?;
            } else {
                writeln!(
                    out,
                    "{:>6}  {} ({})",
                    station.id, station.name, station.description
                )?;
            }
        }
        writeln!(out, "{} stops", stations.len())?;
        Ok(())
    }

    async fn route_stops<W: Write>(
        &self,
        route_id: i64,
        reverse: bool,
        out: &mut W,
    ) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let (links, stations) = tokio::try_join!(
            self.api.route_station_links(city_id),
            self.cache.stations(city_id)
        )?;

        let names: HashMap<i64, &str> = stations
            .iter()
            .map(|station| (station.id, station.name.as_str()))
            .collect();
        let stops = ordered_route_stops(&links, route_id, !reverse);
        if stops.is_empty() {
            writeln!(out, "No stops for route {}", route_id)?;
            return Ok(());
        }
        for stop in stops {
            let name = names.get(&stop.station_id).copied().unwrap_or("(unknown stop)");
            writeln!(out, "{:>3}. {} (#{})", stop.sequence, name, stop.station_id)?;
        }
        Ok(())
    }

    async fn toggle<W: Write>(&mut self, route_id: i64, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let routes = self.cache.routes(city_id).await?;
        let route = routes
            .iter()
            .find(|route| route.id == route_id)
            .ok_or(AppError::UnknownRoute(route_id))?;

        let outcome = self.selection.toggle(route.id, &route.number)?;
        match outcome {
            ToggleOutcome::Selected(color) => {
                writeln!(out, "Tracking route {} in {}", route.number, color)?
            }
            ToggleOutcome::Deselected => writeln!(out, "Stopped tracking route {}", route.number)?,
            ToggleOutcome::SelectionFull => writeln!(
                out,
                "Already tracking {} routes; untrack one first",
                self.selection.selected_route_ids().len()
            )?,
        }
        Ok(())
    }

    fn show_selection<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let numbers = self
            .settings
            .selected_city_id()
            .map(|city_id| self.known_route_numbers(city_id))
            .unwrap_or_default();

        let tracked = self.selection.restore();
        if tracked.is_empty() {
            writeln!(out, "No routes tracked")?;
        }
        for (route_id, color) in tracked {
            let label = numbers
                .get(&route_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", route_id));
            writeln!(out, "{:<8} {:<7} {}", label, color.name(), color.hex())?;
        }

        let recent = self.selection.recent_route_numbers();
        if !recent.is_empty() {
            writeln!(out, "Recent: {}", recent.join(", "))?;
        }
        Ok(())
    }

    async fn map<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let routes = self.cache.routes(city_id).await?;
        let city = match self.api.city(city_id).await {
            Ok(city) => Some(city),
            Err(e) => {
                warn!(city_id, error = %e, "city details unavailable, centering on routes");
                None
            }
        };

        let overlays = route_overlays(&routes, &self.selection);
        let center = camera_center(city.as_ref(), &overlays);
        writeln!(out, "Center: {:.5}, {:.5}", center.lat, center.lon)?;
        for overlay in &overlays {
            writeln!(
                out,
                "{:>5}  {:<7} {}  {} points  {}",
                overlay.number,
                overlay.color.name(),
                overlay.color.hex(),
                overlay.path.len(),
                overlay.name
            )?;
        }
        Ok(())
    }

    /// Routes whose buses a `buses` command shows
    fn bus_routes(&self, route_id: Option<i64>) -> Vec<i64> {
        match route_id {
            Some(route_id) => vec![route_id],
            None => self.selection.selected_route_ids().to_vec(),
        }
    }

    async fn buses<W: Write>(&self, route_id: Option<i64>, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let route_ids = self.bus_routes(route_id);
        if route_ids.is_empty() {
            writeln!(out, "No routes tracked; pass a route id or run `infobus toggle <ID>`")?;
            return Ok(());
        }

        let only_accessible = self.settings.only_accessible_buses();
        let numbers = self.known_route_numbers(city_id);
        let fetches = route_ids
            .iter()
            .map(|&route_id| self.api.buses(city_id, route_id));
        let results = join_all(fetches).await;

        for (route_id, result) in route_ids.iter().zip(results) {
            let buses = visible_buses(result?, only_accessible);
            write_route_buses(out, &route_label(&numbers, *route_id), &buses)?;
        }
        Ok(())
    }

    async fn watch_buses<W: Write>(
        &self,
        route_id: Option<i64>,
        seconds: u64,
        out: &mut W,
    ) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let route_ids = self.bus_routes(route_id);
        if route_ids.is_empty() {
            writeln!(out, "No routes tracked; pass a route id or run `infobus toggle <ID>`")?;
            return Ok(());
        }

        let numbers = self.known_route_numbers(city_id);
        let interval_secs = seconds.max(1);
        let config = RefreshConfig {
            interval: Duration::from_secs(interval_secs),
            only_accessible: self.settings.only_accessible_buses(),
            enabled: true,
        };
        let mut handle = RefreshHandle::spawn(config, Arc::clone(&self.api), city_id, route_ids);

        loop {
            tokio::select! {
                message = handle.recv() => match message {
                    Some(RefreshMessage::RefreshStarted) => {
                        writeln!(out, "-- {} --", Local::now().format("%H:%M:%S"))?;
                    }
                    Some(RefreshMessage::BusesUpdated { route_id, buses }) => {
                        write_route_buses(out, &route_label(&numbers, route_id), &buses)?;
                    }
                    Some(RefreshMessage::RefreshError { route_id, error }) => {
                        warn!(route_id, error = %error, "bus refresh failed");
                        let label = route_label(&numbers, route_id);
                        writeln!(out, "{}", refresh_error_line(&label, &error, interval_secs))?;
                    }
                    Some(RefreshMessage::RefreshCompleted) => out.flush()?,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        handle.shutdown().await;
        Ok(())
    }

    async fn arrivals<W: Write>(&self, station_id: i64, out: &mut W) -> AppResult<()> {
        let city_id = self.selected_city()?;
        let (route_ids, mut predictions) = tokio::try_join!(
            self.api.routes_at_station(city_id, station_id),
            self.api.predictions(city_id, station_id)
        )?;
        sort_predictions(&mut predictions);

        let numbers = match self.cache.routes(city_id).await {
            Ok(routes) => route_numbers(&routes),
            Err(e) => {
                warn!(city_id, error = %e, "route list unavailable, showing route ids");
                HashMap::new()
            }
        };

        let serving: Vec<String> = route_ids
            .iter()
            .map(|&route_id| route_label(&numbers, route_id))
            .collect();
        writeln!(out, "Routes: {}", serving.join(", "))?;

        if predictions.is_empty() {
            writeln!(out, "No arrivals predicted")?;
        }
        for prediction in &predictions {
            write_prediction(out, &route_label(&numbers, prediction.route_id), prediction)?;
        }
        Ok(())
    }
}

fn marker(selected: bool) -> &'static str {
    if selected {
        "*"
    } else {
        " "
    }
}

fn route_numbers(routes: &[Route]) -> HashMap<i64, String> {
    routes
        .iter()
        .map(|route| (route.id, route.number.clone()))
        .collect()
}

fn route_label(numbers: &HashMap<i64, String>, route_id: i64) -> String {
    numbers
        .get(&route_id)
        .cloned()
        .unwrap_or_else(|| format!("#{}", route_id))
}

/// Describes a failed polling round for one route
fn refresh_error_line(label: &str, error: &ApiError, interval_secs: u64) -> String {
    if error.is_transient() {
        format!("Route {}: {} (retrying in {}s)", label, error, interval_secs)
    } else {
        format!("Route {}: {}", label, error)
    }
}

/// Formats seconds until arrival for display
fn format_wait(seconds: i64) -> String {
    if seconds < 60 {
        "now".to_string()
    } else {
        format!("{} min", seconds / 60)
    }
}

fn write_route_buses<W: Write>(out: &mut W, label: &str, buses: &[Bus]) -> std::io::Result<()> {
    writeln!(out, "Route {}: {} buses", label, buses.len())?;
    for bus in buses {
        let mut flags = String::new();
        if bus.accessible {
            flags.push_str("  accessible");
        }
        if bus.offline {
            flags.push_str("  offline");
        }
        if let (Some(level), Some(filling)) = (bus.occupancy(), &bus.filling_info) {
            flags.push_str(&format!("  load: {} ({}%)", level, filling.percentage));
        }
        writeln!(
            out,
            "  {:<12} {:>3} km/h  {:.5}, {:.5}{}",
            bus.name, bus.speed, bus.lat, bus.lon, flags
        )?;
    }
    Ok(())
}

fn write_prediction<W: Write>(
    out: &mut W,
    label: &str,
    prediction: &Prediction,
) -> std::io::Result<()> {
    let at = prediction
        .arrival_at()
        .map(|time| time.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    writeln!(
        out,
        "  {:>5}  {:>7}  {:>5} m  at {}",
        label,
        format_wait(prediction.prediction_seconds),
        prediction.distance_meters,
        at
    )
}
