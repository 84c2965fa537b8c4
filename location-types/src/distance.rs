use crate::geo::Position;

/// Mean radius of the earth, in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two positions, in meters.
pub fn haversine_distance_meters(a: &Position, b: &Position) -> f64 {
    let lat1 = a.latitude.degrees().to_radians();
    let lat2 = b.latitude.degrees().to_radians();
    let delta_lat = (b.latitude.degrees() - a.latitude.degrees()).to_radians();
    let delta_lon = (b.longitude.degrees() - a.longitude.degrees()).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();

    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    let c = 2.0 * h.min(1.0).max(0.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Accuracy;

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon, None, Accuracy::none()).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = pos(55.6761, 12.5683);
        assert_eq!(haversine_distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pos(55.6761, 12.5683);
        let b = pos(59.9139, 10.7522);
        assert!((haversine_distance_meters(&a, &b) - haversine_distance_meters(&b, &a)).abs() < 1e-6);
    }

    #[test]
    fn distance_is_never_negative() {
        let a = pos(-33.8688, 151.2093);
        let b = pos(40.7128, -74.0060);
        assert!(haversine_distance_meters(&a, &b) >= 0.0);
    }

    #[test]
    fn known_distance_copenhagen_to_oslo() {
        let copenhagen = pos(55.6761, 12.5683);
        let oslo = pos(59.9139, 10.7522);
        let d = haversine_distance_meters(&copenhagen, &oslo);
        // ~483 km great-circle distance; allow generous tolerance for the mean-radius approximation.
        assert!((d - 483_000.0).abs() < 10_000.0, "distance was {d}");
    }
}
