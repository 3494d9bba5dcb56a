//! Passenger load classification for buses
//!
//! Buses that carry a passenger counter report how full they are as a
//! percentage of capacity. This module maps that percentage to a coarse
//! level suitable for a badge or a legend.

use std::fmt;

use crate::data::{Bus, Filling};

/// Coarse passenger load of a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OccupancyLevel {
    /// Plenty of free seats
    Low,
    /// Seats may be scarce
    Moderate,
    /// Standing room only
    High,
    /// At or over capacity
    Full,
}

impl OccupancyLevel {
    /// Classifies a load percentage
    ///
    /// # Example
    ///
    /// ```
    /// use infobus::occupancy::OccupancyLevel;
    ///
    /// assert_eq!(OccupancyLevel::from_percentage(15), OccupancyLevel::Low);
    /// assert_eq!(OccupancyLevel::from_percentage(120), OccupancyLevel::Full);
    /// ```
    pub fn from_percentage(percentage: i32) -> Self {
        match percentage {
            i32::MIN..=39 => OccupancyLevel::Low,
            40..=69 => OccupancyLevel::Moderate,
            70..=99 => OccupancyLevel::High,
            _ => OccupancyLevel::Full,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OccupancyLevel::Low => "low",
            OccupancyLevel::Moderate => "moderate",
            OccupancyLevel::High => "high",
            OccupancyLevel::Full => "full",
        }
    }
}

impl fmt::Display for OccupancyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Filling {
    pub fn level(&self) -> OccupancyLevel {
        OccupancyLevel::from_percentage(self.percentage)
    }
}

impl Bus {
    /// Passenger load, if the bus reports one
    pub fn occupancy(&self) -> Option<OccupancyLevel> {
        self.filling_info.as_ref().map(Filling::level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::bus;

    #[test]
    fn test_thresholds() {
        assert_eq!(OccupancyLevel::from_percentage(0), OccupancyLevel::Low);
        assert_eq!(OccupancyLevel::from_percentage(39), OccupancyLevel::Low);
        assert_eq!(OccupancyLevel::from_percentage(40), OccupancyLevel::Moderate);
        assert_eq!(OccupancyLevel::from_percentage(69), OccupancyLevel::Moderate);
        assert_eq!(OccupancyLevel::from_percentage(70), OccupancyLevel::High);
        assert_eq!(OccupancyLevel::from_percentage(99), OccupancyLevel::High);
        assert_eq!(OccupancyLevel::from_percentage(100), OccupancyLevel::Full);
    }

    #[test]
    fn test_negative_percentage_is_low() {
        assert_eq!(OccupancyLevel::from_percentage(-5), OccupancyLevel::Low);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(OccupancyLevel::Low < OccupancyLevel::Moderate);
        assert!(OccupancyLevel::High < OccupancyLevel::Full);
    }

    #[test]
    fn test_bus_without_filling_has_no_occupancy() {
        assert_eq!(bus(1, true).occupancy(), None);
    }

    #[test]
    fn test_bus_with_filling_reports_level() {
        let mut b = bus(1, true);
        b.filling_info = Some(Filling {
            capacity: 80,
            filling: 60,
            percentage: 75,
            updated_at: "2025-09-30T10:15:00Z".to_string(),
        });

        assert_eq!(b.occupancy(), Some(OccupancyLevel::High));
        assert_eq!(b.occupancy().unwrap().to_string(), "high");
    }
}
