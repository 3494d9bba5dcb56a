//! Map overlays for the tracked routes
//!
//! Turns the current selection and the cached route list into the polylines a
//! map draws, and picks where the map camera should start.

use serde::Serialize;

use crate::data::{CityDetail, Coordinate, Route};
use crate::selection::{RouteColor, SelectionManager};

/// Camera center used when neither a city nor a route path is available
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 51.1605,
    lon: 71.4704,
};

/// A selected route ready to be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub route_id: i64,
    pub number: String,
    pub name: String,
    pub color: RouteColor,
    pub path: Vec<Coordinate>,
}

/// Builds one overlay per selected route, in selection order
///
/// Selected ids missing from `routes` (e.g. selected in another city) and
/// routes whose path decodes to nothing are skipped.
pub fn route_overlays(routes: &[Route], selection: &SelectionManager) -> Vec<RouteOverlay> {
    selection
        .restore()
        .into_iter()
        .filter_map(|(route_id, color)| {
            let route = routes.iter().find(|route| route.id == route_id)?;
            let path = route.path();
            if path.is_empty() {
                return None;
            }
            Some(RouteOverlay {
                route_id,
                number: route.number.clone(),
                name: route.name.clone(),
                color,
                path,
            })
        })
        .collect()
}

/// Where the map should be centered initially
pub fn camera_center(city: Option<&CityDetail>, overlays: &[RouteOverlay]) -> Coordinate {
    if let Some(city) = city {
        return city.center();
    }
    overlays
        .first()
        .and_then(|overlay| overlay.path.first().copied())
        .unwrap_or(DEFAULT_CENTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::route;
    use crate::store::{FileStore, Settings};
    use tempfile::TempDir;

    fn selection_with(ids: &[i64]) -> (SelectionManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
        settings.set_selected_route_ids(ids).unwrap();
        (SelectionManager::load(settings), temp_dir)
    }

    #[test]
    fn test_overlays_follow_selection_order_and_colors() {
        let routes = vec![route(3, 1, "3"), route(7, 1, "7"), route(9, 1, "9")];
        let (selection, _temp_dir) = selection_with(&[7, 3]);

        let overlays = route_overlays(&routes, &selection);

        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].route_id, 7);
        assert_eq!(overlays[0].color, RouteColor::Red);
        assert_eq!(overlays[1].route_id, 3);
        assert_eq!(overlays[1].color, RouteColor::Blue);
        assert_eq!(overlays[0].path.len(), 2);
    }

    #[test]
    fn test_overlays_skip_unknown_and_empty_routes() {
        let mut empty = route(5, 1, "5");
        empty.path_encoding = String::new();
        let routes = vec![route(3, 1, "3"), empty];
        let (selection, _temp_dir) = selection_with(&[42, 5, 3]);

        let overlays = route_overlays(&routes, &selection);

        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].route_id, 3);
        // Color still comes from the position in the selection
        assert_eq!(overlays[0].color, RouteColor::Green);
    }

    #[test]
    fn test_camera_prefers_city_center() {
        let city = CityDetail {
            id: 1,
            name: "Almaty".to_string(),
            lat: 43.238,
            lon: 76.945,
            zoom: 12,
            map_layers: vec![],
            message: String::new(),
            display_message: false,
        };
        let routes = vec![route(3, 1, "3")];
        let (selection, _temp_dir) = selection_with(&[3]);
        let overlays = route_overlays(&routes, &selection);

        let center = camera_center(Some(&city), &overlays);

        assert!((center.lat - 43.238).abs() < 1e-9);
    }

    #[test]
    fn test_camera_falls_back_to_first_route_point_then_default() {
        let routes = vec![route(3, 1, "3")];
        let (selection, _temp_dir) = selection_with(&[3]);
        let overlays = route_overlays(&routes, &selection);

        let center = camera_center(None, &overlays);
        assert!((center.lat - 51.1).abs() < 1e-9);
        assert!((center.lon - 71.4).abs() < 1e-9);

        assert_eq!(camera_center(None, &[]), DEFAULT_CENTER);
    }
}
