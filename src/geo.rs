//! Short-range geodesy.
//!
//! Distances here use an equirectangular approximation (1° of latitude is
//! 111 km, 1° of longitude is 111 km scaled by the cosine of the reference
//! latitude). At the tens-of-kilometres ranges the monitor works with this
//! is well within the accuracy of an AIS fix. [`offset`] is the exact
//! inverse of [`distance_km`] for the same reference point, so a vessel
//! synthesized at 0.5 km measures 0.5 km.

use crate::model::Position;

/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Smallest cosine used for longitude scaling, keeps the maths finite at the poles.
const MIN_LONGITUDE_SCALE: f64 = 1e-6;

fn longitude_scale(reference: &Position) -> f64 {
    reference
        .latitude
        .to_radians()
        .cos()
        .max(MIN_LONGITUDE_SCALE)
}

/// Wrap a longitude (or longitude difference) into [-180, 180).
pub fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed longitude difference from `from` to `to` taking the short way
/// round, so points either side of the antimeridian are close.
pub fn longitude_delta(from: &Position, to: &Position) -> f64 {
    wrap_longitude(to.longitude - from.longitude)
}

/// Distance in kilometres from `from` to `to`, scaled at `from`'s latitude.
pub fn distance_km(from: &Position, to: &Position) -> f64 {
    let dlat_km = (to.latitude - from.latitude) * KM_PER_DEGREE;
    let dlon_km = longitude_delta(from, to) * KM_PER_DEGREE * longitude_scale(from);
    (dlat_km * dlat_km + dlon_km * dlon_km).sqrt()
}

/// Position `distance_km` away from `center` along `bearing_rad`
/// (0 is north, increasing clockwise).
///
/// Longitude is wrapped across the antimeridian. Latitude is not folded
/// over the poles; callers must check [`Position::is_valid`].
pub fn offset(center: &Position, distance_km: f64, bearing_rad: f64) -> Position {
    let dlat = distance_km / KM_PER_DEGREE * bearing_rad.cos();
    let dlon = distance_km / (KM_PER_DEGREE * longitude_scale(center)) * bearing_rad.sin();
    Position::new(center.latitude + dlat, wrap_longitude(center.longitude + dlon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const MUMBAI: Position = Position::MUMBAI_HARBOUR;

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_km(&MUMBAI, &MUMBAI), 0.0);
    }

    #[test]
    fn test_one_degree_north() {
        let north = Position::new(MUMBAI.latitude + 1.0, MUMBAI.longitude);
        assert!((distance_km(&MUMBAI, &north) - 111.0).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_scaled_by_latitude() {
        let equator = Position::new(0.0, 0.0);
        let east = Position::new(0.0, 1.0);
        assert!((distance_km(&equator, &east) - 111.0).abs() < 1e-9);

        let east_of_mumbai = Position::new(MUMBAI.latitude, MUMBAI.longitude + 1.0);
        let expected = 111.0 * MUMBAI.latitude.to_radians().cos();
        assert!((distance_km(&MUMBAI, &east_of_mumbai) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_offset_round_trips_distance() {
        for (distance, bearing) in [(0.5, 0.0), (2.0, PI / 3.0), (10.0, 1.5 * PI), (49.9, 5.9)] {
            let moved = offset(&MUMBAI, distance, bearing);
            assert!((distance_km(&MUMBAI, &moved) - distance).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let west = Position::new(0.0, 179.9995);
        let east = Position::new(0.0, -179.9995);
        let expected = 0.001 * KM_PER_DEGREE;
        assert!((distance_km(&west, &east) - expected).abs() < 1e-6);
        assert!((distance_km(&east, &west) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_offset_wraps_longitude() {
        let center = Position::new(0.0, 179.9);
        let moved = offset(&center, 50.0, PI / 2.0);
        assert!(moved.is_valid());
        assert!(moved.longitude < 0.0);
        assert!((distance_km(&center, &moved) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-359.9).round(), 0.0);
        assert!((wrap_longitude(72.8777) - 72.8777).abs() < 1e-9);
    }

    #[test]
    fn test_offset_near_pole_stays_finite() {
        let pole = Position::new(90.0, 0.0);
        let moved = offset(&pole, 5.0, PI / 2.0);
        assert!(moved.latitude.is_finite());
        assert!(moved.longitude.is_finite());
    }
}
