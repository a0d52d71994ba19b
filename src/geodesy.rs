use geo::Point;
use itertools::Itertools as _;
use uom::si::f64::Length;
use uom::si::length::{kilometer, meter};

/// IUGG mean Earth radius. The only radius used for great-circle distances.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Spherical earth used for haversine and cross-track distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EarthModel {
    pub radius: Length,
}

impl Default for EarthModel {
    fn default() -> Self {
        Self {
            radius: Length::new::<kilometer>(EARTH_MEAN_RADIUS_KM),
        }
    }
}

impl EarthModel {
    pub fn with_radius(radius: Length) -> Self {
        Self { radius }
    }

    fn arc(&self, radians: f64) -> Length {
        Length::new::<meter>(self.radius.get::<meter>() * radians)
    }

    /// Central angle between two points in radians.
    pub fn central_angle(a: Point, b: Point) -> f64 {
        let lat1 = a.y().to_radians();
        let lat2 = b.y().to_radians();
        let d_lat = (b.y() - a.y()).to_radians();
        let d_lon = (b.x() - a.x()).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * h.sqrt().atan2((1.0 - h).sqrt())
    }

    /// Initial great-circle bearing from `a` towards `b` in radians.
    pub fn initial_bearing(a: Point, b: Point) -> f64 {
        let lat1 = a.y().to_radians();
        let lat2 = b.y().to_radians();
        let d_lon = (b.x() - a.x()).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        y.atan2(x)
    }

    pub fn haversine(&self, a: Point, b: Point) -> Length {
        self.arc(Self::central_angle(a, b))
    }

    /// Unsigned distance of `point` from the great circle through `start`
    /// and `end`.
    pub fn cross_track(&self, point: Point, start: Point, end: Point) -> Length {
        let d13 = Self::central_angle(start, point);
        let theta13 = Self::initial_bearing(start, point);
        let theta12 = Self::initial_bearing(start, end);
        let xt = (d13.sin() * (theta13 - theta12).sin())
            .clamp(-1.0, 1.0)
            .asin();
        self.arc(xt.abs())
    }

    pub fn polyline_length(&self, points: &[Point]) -> Length {
        self.arc(
            points
                .iter()
                .tuple_windows()
                .map(|(a, b)| Self::central_angle(*a, *b))
                .sum(),
        )
    }
}

#[cfg(test)]
mod test {
    use geo::point;
    use uom::si::f64::Length;
    use uom::si::length::{kilometer, meter, nautical_mile};

    use super::EarthModel;

    #[test]
    fn test_one_degree_of_latitude() {
        let earth = EarthModel::default();
        let d = earth.haversine(point! { x: 0.0, y: 0.0 }, point! { x: 0.0, y: 1.0 });
        assert!(
            (d.get::<kilometer>() - 111.195_08).abs() < 1e-3,
            "{:?}",
            d.get::<kilometer>()
        );
        assert!((d.get::<nautical_mile>() - 60.04).abs() < 0.01);
    }

    #[test]
    fn test_radius_is_configurable() {
        let earth = EarthModel::with_radius(Length::new::<nautical_mile>(3440.065));
        let (a, b) = (point! { x: 10.0, y: 50.0 }, point! { x: 10.0, y: 51.0 });
        let d = earth.haversine(a, b);
        assert!((d.get::<nautical_mile>() - 60.04).abs() < 0.01);
    }

    #[test]
    fn test_cross_track() {
        let earth = EarthModel::default();
        let start = point! { x: 0.0, y: 0.0 };
        let end = point! { x: 10.0, y: 0.0 };
        // along the equator the cross-track distance is the meridian arc
        let xt = earth.cross_track(point! { x: 5.0, y: 1.0 }, start, end);
        let direct = earth.haversine(point! { x: 5.0, y: 0.0 }, point! { x: 5.0, y: 1.0 });
        assert!((xt.get::<meter>() - direct.get::<meter>()).abs() < 1.0);

        let on_track = earth.cross_track(point! { x: 3.0, y: 0.0 }, start, end);
        assert!(on_track.get::<meter>() < 1e-6);
    }

    #[test]
    fn test_polyline_length() {
        let earth = EarthModel::default();
        let points = [
            point! { x: 0.0, y: 0.0 },
            point! { x: 0.0, y: 1.0 },
            point! { x: 0.0, y: 2.0 },
        ];
        let whole = earth.haversine(points[0], points[2]);
        let length = earth.polyline_length(&points);
        assert!((whole.get::<meter>() - length.get::<meter>()).abs() < 1e-6);
        assert!(earth.polyline_length(&points[..1]).get::<meter>().abs() < f64::EPSILON);
    }
}
