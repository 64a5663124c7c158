use std::f64::consts::PI;

const MILES_PER_NAUTICAL_MINUTE: f64 = 1.1515;
const KILOMETERS_PER_MILE: f64 = 1.609344;
const NAUTICAL_MILES_PER_MILE: f64 = 0.8684;

/// Output unit for [`distance`]. `None` means statute miles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Kilometers,
    NauticalMiles,
}

impl Unit {
    /// Maps the single-letter codes `"K"` and `"N"`; anything else is miles.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "K" => Some(Self::Kilometers),
            "N" => Some(Self::NauticalMiles),
            _ => None,
        }
    }
}

/// Great-circle distance between two points in decimal degrees, using the
/// spherical law of cosines.
///
/// The cosine argument is clamped at 1.0 so nearly identical points give 0
/// instead of NaN. There is no lower clamp and no range check on the inputs.
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64, unit: Option<Unit>) -> f64 {
    let radlat1 = PI * lat1 / 180.0;
    let radlat2 = PI * lat2 / 180.0;
    let radtheta = PI * (lng1 - lng2) / 180.0;

    let mut cos_arg =
        radlat1.sin() * radlat2.sin() + radlat1.cos() * radlat2.cos() * radtheta.cos();
    // NaN must fall through, `f64::min` would turn it into 1.
    if cos_arg > 1.0 {
        cos_arg = 1.0;
    }

    let degrees = cos_arg.acos() * 180.0 / PI;
    let miles = degrees * 60.0 * MILES_PER_NAUTICAL_MINUTE;

    match unit {
        Some(Unit::Kilometers) => miles * KILOMETERS_PER_MILE,
        Some(Unit::NauticalMiles) => miles * NAUTICAL_MILES_PER_MILE,
        None => miles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: [Option<Unit>; 3] = [None, Some(Unit::Kilometers), Some(Unit::NauticalMiles)];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_identical_points_are_zero() {
        for unit in UNITS {
            assert_eq!(distance(0.0, 103.8198, 0.0, 103.8198, unit), 0.0);
            // Rounding in sin^2 + cos^2 can leave a sub-metre residue.
            assert!(distance(1.3521, 103.8198, 1.3521, 103.8198, unit) < 1e-3);
            assert!(distance(-33.86, 151.2, -33.86, 151.2, unit) < 1e-3);
        }
    }

    #[test]
    fn test_symmetric() {
        let (a, b) = ((1.3521, 103.8198), (1.2903, 103.8520));
        for unit in UNITS {
            let ab = distance(a.0, a.1, b.0, b.1, unit);
            let ba = distance(b.0, b.1, a.0, a.1, unit);
            assert!(close(ab, ba), "{ab} != {ba}");
        }
    }

    #[test]
    fn test_unit_conversion() {
        let miles = distance(40.7128, -74.0060, 34.0522, -118.2437, None);
        let km = distance(40.7128, -74.0060, 34.0522, -118.2437, Some(Unit::Kilometers));
        let nm = distance(40.7128, -74.0060, 34.0522, -118.2437, Some(Unit::NauticalMiles));

        assert!(close(km, miles * 1.609344));
        assert!(close(nm, miles * 0.8684));
        // New York to Los Angeles is roughly 3,940 km.
        assert!((3900.0..4000.0).contains(&km), "{km}");
    }

    #[test]
    fn test_nearly_identical_points_do_not_produce_nan() {
        for i in 0..1000 {
            let lat = -80.0 + f64::from(i) * 0.16;
            let lng = -170.0 + f64::from(i) * 0.34;
            for unit in UNITS {
                let d = distance(lat, lng, lat + 1e-12, lng - 1e-12, unit);
                assert!(!d.is_nan(), "NaN at {lat},{lng}");
                assert!(d >= 0.0);
            }
        }
    }

    #[test]
    fn test_nan_coordinates_stay_nan() {
        for unit in UNITS {
            assert!(distance(f64::NAN, 0.0, 1.0, 1.0, unit).is_nan());
            assert!(distance(1.0, 1.0, 1.0, f64::NAN, unit).is_nan());
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree along a meridian is 60 nautical minutes.
        let miles = distance(0.0, 0.0, 1.0, 0.0, None);
        assert!(close(miles, 60.0 * 1.1515), "{miles}");
    }

    #[test]
    fn test_unit_from_code() {
        assert_eq!(Unit::from_code("K"), Some(Unit::Kilometers));
        assert_eq!(Unit::from_code("N"), Some(Unit::NauticalMiles));
        assert_eq!(Unit::from_code("M"), None);
        assert_eq!(Unit::from_code("k"), None);
        assert_eq!(Unit::from_code(""), None);
    }
}
