//! Route polyline decoding
//!
//! Routes carry their geometry as a flat string of numbers in
//! longitude/latitude order, e.g. `"71.4,51.1,71.5,51.2"`. Tokens may be
//! separated by commas and/or whitespace.

use serde::{Deserialize, Serialize};

/// A point on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Decodes a route polyline string into an ordered list of coordinates
///
/// Tokens that are not finite numbers are skipped before pairing. A trailing
/// unpaired token is discarded.
pub fn decode_path(encoded: &str) -> Vec<Coordinate> {
    let values: Vec<f64> = encoded
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|token| token.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect();

    values
        .chunks_exact(2)
        .map(|pair| Coordinate {
            lon: pair[0],
            lat: pair[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_coord(actual: Coordinate, lat: f64, lon: f64) {
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {}", actual.lat, lat);
        assert!((actual.lon - lon).abs() < 1e-9, "lon {} != {}", actual.lon, lon);
    }

    #[test]
    fn test_decodes_lon_lat_pairs_into_lat_lon() {
        let path = decode_path("71.4,51.1,71.5,51.2");

        assert_eq!(path.len(), 2);
        assert_coord(path[0], 51.1, 71.4);
        assert_coord(path[1], 51.2, 71.5);
    }

    #[test]
    fn test_odd_token_count_drops_trailing_token() {
        let path = decode_path("71.4,51.1,71.5");

        assert_eq!(path.len(), 1);
        assert_coord(path[0], 51.1, 71.4);
    }

    #[test]
    fn test_accepts_spaces_and_mixed_separators() {
        let path = decode_path("71.4, 51.1 71.5,51.2");

        assert_eq!(path.len(), 2);
        assert_coord(path[1], 51.2, 71.5);
    }

    #[test]
    fn test_skips_invalid_tokens() {
        let path = decode_path("71.4,abc,51.1,,NaN,71.5,51.2");

        assert_eq!(path.len(), 2);
        assert_coord(path[0], 51.1, 71.4);
        assert_coord(path[1], 51.2, 71.5);
    }

    #[test]
    fn test_empty_string_decodes_to_empty_path() {
        assert!(decode_path("").is_empty());
        assert!(decode_path("71.4").is_empty());
    }
}
