//! Coordinate projection seam.
//!
//! Network data and seed points come in geographic coordinates, all
//! distances are measured in a local projected reference system resolved
//! per seed point.

use geo::{Coord, MapCoords, Point, Rect};

use crate::Error;

/// Forward and inverse transforms between geographic and projected
/// coordinates.
pub trait Projection {
    /// Geographic (lon, lat) to projected (x, y)
    fn forward(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Projected (x, y) to geographic (lon, lat)
    fn inverse(&self, coord: Coord<f64>) -> Coord<f64>;

    fn forward_geometry<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
        Self: Sized,
    {
        geometry.map_coords(|coord| self.forward(coord))
    }

    fn inverse_geometry<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
        Self: Sized,
    {
        geometry.map_coords(|coord| self.inverse(coord))
    }

    /// Geographic envelope covering a projected rectangle
    fn inverse_envelope(&self, rect: &Rect<f64>) -> Rect<f64> {
        let (min, max) = (rect.min(), rect.max());
        let corners = [
            self.inverse(min),
            self.inverse(Coord { x: max.x, y: min.y }),
            self.inverse(max),
            self.inverse(Coord { x: min.x, y: max.y }),
        ];

        let (mut lo, mut hi) = (corners[0], corners[0]);
        for corner in &corners[1..] {
            lo.x = lo.x.min(corner.x);
            lo.y = lo.y.min(corner.y);
            hi.x = hi.x.max(corner.x);
            hi.y = hi.y.max(corner.y);
        }
        Rect::new(lo, hi)
    }
}

/// Resolves the projected reference system to use around a seed point
pub trait CrsResolver {
    type Projection: Projection;

    fn resolve(&self, seed: Point<f64>) -> Result<Self::Projection, Error>;
}

/// A Local Tangent Plane projection centered at a specific (lon0, lat0).
/// Projects (lon, lat) to (x, y) meters and back.
/// Uses the equirectangular approximation, which keeps local distances
/// within the reach of an isochrone and has an exact inverse.
/// x = R * cos(lat0) * dlon
/// y = R * dlat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTangentPlane {
    origin_lon_rad: f64,
    origin_lat_rad: f64,
    cos_lat0: f64,
    radius: f64,
}

impl LocalTangentPlane {
    const EARTH_RADIUS: f64 = 6_371_007.2;

    pub fn new(lon0: f64, lat0: f64) -> Self {
        let origin_lon_rad = lon0.to_radians();
        let origin_lat_rad = lat0.to_radians();
        Self {
            origin_lon_rad,
            origin_lat_rad,
            cos_lat0: origin_lat_rad.cos(),
            radius: Self::EARTH_RADIUS,
        }
    }
}

impl Projection for LocalTangentPlane {
    fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        let dlon = coord.x.to_radians() - self.origin_lon_rad;
        let dlat = coord.y.to_radians() - self.origin_lat_rad;
        Coord {
            x: self.radius * self.cos_lat0 * dlon,
            y: self.radius * dlat,
        }
    }

    fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        let dlon = coord.x / (self.radius * self.cos_lat0);
        let dlat = coord.y / self.radius;
        Coord {
            x: (self.origin_lon_rad + dlon).to_degrees(),
            y: (self.origin_lat_rad + dlat).to_degrees(),
        }
    }
}

/// Resolves a [`LocalTangentPlane`] centred on every seed point
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTangentPlaneResolver;

impl CrsResolver for LocalTangentPlaneResolver {
    type Projection = LocalTangentPlane;

    fn resolve(&self, seed: Point<f64>) -> Result<Self::Projection, Error> {
        let (lon, lat) = (seed.x(), seed.y());
        if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() >= 89.0 {
            return Err(Error::Projection(format!(
                "location {lat},{lon} is not supported for service area generation"
            )));
        }
        Ok(LocalTangentPlane::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon};

    use super::*;

    #[test]
    fn origin_maps_to_zero() {
        let plane = LocalTangentPlane::new(144.96, -37.81);
        let origin = plane.forward(coord! { x: 144.96, y: -37.81 });
        assert!(origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let plane = LocalTangentPlane::new(0.0, 0.0);
        let projected = plane.forward(coord! { x: 0.0, y: 1.0 });
        assert!((projected.y - 111_195.0).abs() < 10.0);
    }

    #[test]
    fn geometries_round_trip() {
        let plane = LocalTangentPlane::new(151.2, -33.87);
        let projected = polygon![
            (x: -120.5, y: 40.25),
            (x: 380.0, y: 40.25),
            (x: 380.0, y: 160.75),
        ];
        let back = plane.forward_geometry(&plane.inverse_geometry(&projected));

        for (a, b) in projected.exterior().0.iter().zip(&back.exterior().0) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn inverse_envelope_covers_corners() {
        let plane = LocalTangentPlane::new(10.0, 50.0);
        let rect = Rect::new(coord! { x: -500.0, y: -500.0 }, coord! { x: 500.0, y: 500.0 });
        let envelope = plane.inverse_envelope(&rect);
        assert!(envelope.min().x < 10.0 && envelope.max().x > 10.0);
        assert!(envelope.min().y < 50.0 && envelope.max().y > 50.0);
    }

    #[test]
    fn polar_seeds_are_rejected() {
        let resolver = LocalTangentPlaneResolver;
        assert!(resolver.resolve(Point::new(0.0, 89.5)).is_err());
        assert!(resolver.resolve(Point::new(f64::NAN, 0.0)).is_err());
        assert!(resolver.resolve(Point::new(2.35, 48.85)).is_ok());
    }
}
