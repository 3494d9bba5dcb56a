//! Ordering helpers for route stops and arrival predictions

use super::{Prediction, RouteStationLink};

/// Returns the stops of one route in one direction, ordered by sequence number
pub fn ordered_route_stops(
    links: &[RouteStationLink],
    route_id: i64,
    forward: bool,
) -> Vec<&RouteStationLink> {
    let mut stops: Vec<&RouteStationLink> = links
        .iter()
        .filter(|link| link.route_id == route_id && link.direction_forward == forward)
        .collect();
    stops.sort_by_key(|link| link.sequence);
    stops
}

/// Sorts predictions so the soonest arrival comes first
pub fn sort_predictions(predictions: &mut [Prediction]) {
    predictions.sort_by_key(|prediction| prediction.prediction_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: i64, route_id: i64, station_id: i64, sequence: i64, forward: bool) -> RouteStationLink {
        RouteStationLink {
            id,
            city_id: 1,
            route_id,
            station_id,
            sequence,
            direction_forward: forward,
        }
    }

    fn prediction(route_id: i64, seconds: i64) -> Prediction {
        Prediction {
            avg_speed: 20,
            bus_imei: "1".to_string(),
            distance_meters: 500,
            generated_at_ms: 0,
            is_main_prediction: true,
            message_at_ms: 0,
            prediction_seconds: seconds,
            is_reverse_direction: false,
            route_id,
            speed: 20,
            station_id: 1,
        }
    }

    #[test]
    fn test_ordered_route_stops_filters_route_and_direction() {
        let links = vec![
            link(1, 5, 100, 3, true),
            link(2, 5, 101, 1, true),
            link(3, 5, 102, 2, false),
            link(4, 6, 103, 0, true),
            link(5, 5, 104, 2, true),
        ];

        let forward: Vec<i64> = ordered_route_stops(&links, 5, true)
            .iter()
            .map(|l| l.station_id)
            .collect();
        assert_eq!(forward, vec![101, 104, 100]);

        let backward: Vec<i64> = ordered_route_stops(&links, 5, false)
            .iter()
            .map(|l| l.station_id)
            .collect();
        assert_eq!(backward, vec![102]);
    }

    #[test]
    fn test_ordered_route_stops_unknown_route_is_empty() {
        let links = vec![link(1, 5, 100, 1, true)];
        assert!(ordered_route_stops(&links, 99, true).is_empty());
    }

    #[test]
    fn test_sort_predictions_soonest_first() {
        let mut predictions = vec![prediction(1, 600), prediction(2, 60), prediction(3, 300)];

        sort_predictions(&mut predictions);

        let routes: Vec<i64> = predictions.iter().map(|p| p.route_id).collect();
        assert_eq!(routes, vec![2, 3, 1]);
    }
}
