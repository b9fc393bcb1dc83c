//! Latitude and longitude of the forecast point.

use serde::{Deserialize, Serialize};

/// The latitude and longitude in degrees, as given in `geo_coordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coords {
    /// Degrees north.
    #[serde(rename = "latitude")]
    pub lat: f64,
    /// Degrees east, either -180 to 180 or 0 to 360.
    #[serde(rename = "longitude")]
    pub lon: f64,
}

impl Coords {
    /// The same point with the longitude in [0, 360), the convention of NCEP grids.
    pub fn to_east_positive(self) -> Self {
        Coords {
            lat: self.lat,
            lon: self.lon.rem_euclid(360.0),
        }
    }
}

impl From<(f64, f64)> for Coords {
    fn from(pair: (f64, f64)) -> Self {
        Self {
            lat: pair.0,
            lon: pair.1,
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_east_positive() {
        let chajnantor = Coords::from((-22.72712, -67.33196)).to_east_positive();
        assert!((chajnantor.lon - 292.66804).abs() < 1.0e-9);
        assert_eq!(chajnantor.lat, -22.72712);

        let greenwich = Coords::from((51.48, 0.0)).to_east_positive();
        assert_eq!(greenwich.lon, 0.0);

        let east = Coords::from((0.0, 370.0)).to_east_positive();
        assert!((east.lon - 10.0).abs() < 1.0e-9);
    }
}
