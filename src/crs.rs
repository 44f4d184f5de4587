//! Coordinate reference systems and projection math.
//!
//! Geometry enters the engine tagged with one of three supported CRS, and
//! every distance or area measurement runs in a metric one. Conversions pivot
//! through WGS84, so any supported pair can be reprojected. Web Mercator uses
//! the spherical formulation; UTM uses the transverse Mercator series from
//! Snyder's "Map Projections: A Working Manual" (USGS PP 1395).

use crate::{EngineError, Result};
use geo::{
    Coord, Geometry, GeometryCollection, Line, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Rect,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_MERCATOR_LATITUDE: f64 = 85.05112878;

/// Maximum latitude covered by the UTM grid
pub const MAX_UTM_LATITUDE: f64 = 84.0;

/// WGS84 semi-major axis in meters
const WGS84_A: f64 = 6378137.0;
/// WGS84 first eccentricity squared, derived from flattening 1/298.257223563
const WGS84_E2: f64 = 0.006694379990141316;
/// Scale factor on the UTM central meridian
const UTM_K0: f64 = 0.9996;
/// UTM false easting in meters
const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for the southern hemisphere in meters
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;
/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;
/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;
/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Coordinate reference system attached to layers, buffers and tiles.
///
/// The set is closed: these are the only CRS the engine measures in, and
/// every geometry-bearing structure carries one explicitly. Coordinates are
/// always stored `x` = easting/longitude, `y` = northing/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Crs {
    /// Geographic coordinates in degrees (EPSG:4326). Not metric.
    Wgs84,
    /// Universal Transverse Mercator zone in meters (EPSG:326xx / 327xx)
    Utm { zone: u8, north: bool },
    /// Spherical Web Mercator in meters (EPSG:3857)
    WebMercator,
}

impl Crs {
    /// Whether coordinates in this CRS are expressed in meters.
    ///
    /// Distances and areas are only meaningful in a metric CRS; layers in
    /// [`Crs::Wgs84`] are reprojected before measurement.
    pub fn is_metric(&self) -> bool {
        !matches!(self, Crs::Wgs84)
    }

    /// EPSG code of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm { zone, north: true } => 32600 + u32::from(*zone),
            Crs::Utm { zone, north: false } => 32700 + u32::from(*zone),
            Crs::WebMercator => 3857,
        }
    }

    /// UTM zone containing the given WGS84 position.
    ///
    /// Grid zone exceptions (Norway, Svalbard) are not applied.
    pub fn utm_for(lon: f64, lat: f64) -> Crs {
        let zone = (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8;
        Crs::Utm {
            zone,
            north: lat >= 0.0,
        }
    }

    /// Pick the preferred metric CRS for a WGS84 extent.
    ///
    /// Returns the UTM zone of the extent's center when the whole extent fits
    /// a single zone within the UTM latitude band. Extents that span zones or
    /// reach beyond ±84° latitude cannot be measured in UTM and yield a
    /// [`EngineError::Reprojection`]; callers fall back to
    /// [`Crs::WebMercator`] (see [`crate::layer::FeatureLayer::metric_crs`]).
    pub fn metric_for_extent(extent: Rect<f64>) -> Result<Crs> {
        let (min, max) = (extent.min(), extent.max());
        let center = extent.center();
        let candidate = Crs::utm_for(center.x, center.y);
        if min.y < -MAX_UTM_LATITUDE || max.y > MAX_UTM_LATITUDE {
            return Err(EngineError::Reprojection {
                from: Crs::Wgs84,
                to: candidate,
                reason: format!(
                    "latitude range [{:.4}, {:.4}] exceeds the UTM band",
                    min.y, max.y
                ),
            });
        }
        if Crs::utm_for(min.x, center.y) != Crs::utm_for(max.x, center.y) {
            return Err(EngineError::Reprojection {
                from: Crs::Wgs84,
                to: candidate,
                reason: format!(
                    "longitude range [{:.4}, {:.4}] spans multiple UTM zones",
                    min.x, max.x
                ),
            });
        }
        Ok(candidate)
    }

    /// Central meridian of a UTM zone in degrees.
    fn utm_central_meridian(zone: u8) -> f64 {
        f64::from(zone) * 6.0 - 183.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Reproject a single coordinate between two supported CRS.
///
/// Identity when `from == to`. Anything else pivots through WGS84. Web
/// Mercator clamps latitude to its valid range; UTM refuses latitudes beyond
/// ±84° with [`EngineError::Reprojection`].
pub fn project(coord: Coord<f64>, from: Crs, to: Crs) -> Result<Coord<f64>> {
    if !(coord.x.is_finite() && coord.y.is_finite()) {
        return Err(EngineError::Reprojection {
            from,
            to,
            reason: format!("non-finite coordinate ({}, {})", coord.x, coord.y),
        });
    }
    if from == to {
        return Ok(coord);
    }
    let geographic = to_wgs84(coord, from);
    from_wgs84(geographic, to)
}

/// Reproject a whole geometry, coordinate by coordinate.
///
/// `Rect` and `Triangle` lose axis alignment under projection and come back
/// as polygons. Everything else keeps its variant.
pub fn project_geometry(geometry: &Geometry<f64>, from: Crs, to: Crs) -> Result<Geometry<f64>> {
    if from == to {
        return Ok(geometry.clone());
    }
    Ok(match geometry {
        Geometry::Point(p) => Geometry::Point(Point(project(p.0, from, to)?)),
        Geometry::Line(l) => Geometry::Line(Line::new(
            project(l.start, from, to)?,
            project(l.end, from, to)?,
        )),
        Geometry::LineString(ls) => Geometry::LineString(project_line_string(ls, from, to)?),
        Geometry::Polygon(poly) => Geometry::Polygon(project_polygon(poly, from, to)?),
        Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint(
            mp.0
                .iter()
                .map(|p| Ok(Point(project(p.0, from, to)?)))
                .collect::<Result<Vec<_>>>()?,
        )),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0
                .iter()
                .map(|ls| project_line_string(ls, from, to))
                .collect::<Result<Vec<_>>>()?,
        )),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
            mp.0
                .iter()
                .map(|poly| project_polygon(poly, from, to))
                .collect::<Result<Vec<_>>>()?,
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0
                .iter()
                .map(|g| project_geometry(g, from, to))
                .collect::<Result<Vec<_>>>()?,
        )),
        Geometry::Rect(r) => Geometry::Polygon(project_polygon(&r.to_polygon(), from, to)?),
        Geometry::Triangle(t) => Geometry::Polygon(project_polygon(&t.to_polygon(), from, to)?),
    })
}

fn project_line_string(ls: &LineString<f64>, from: Crs, to: Crs) -> Result<LineString<f64>> {
    Ok(LineString(
        ls.0.iter()
            .map(|c| project(*c, from, to))
            .collect::<Result<Vec<_>>>()?,
    ))
}

fn project_polygon(poly: &Polygon<f64>, from: Crs, to: Crs) -> Result<Polygon<f64>> {
    let exterior = project_line_string(poly.exterior(), from, to)?;
    let interiors = poly
        .interiors()
        .iter()
        .map(|ring| project_line_string(ring, from, to))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Inverse projection into WGS84 degrees.
fn to_wgs84(coord: Coord<f64>, from: Crs) -> Coord<f64> {
    match from {
        Crs::Wgs84 => coord,
        Crs::WebMercator => mercator_to_wgs84(coord),
        Crs::Utm { zone, north } => utm_to_wgs84(coord, zone, north),
    }
}

/// Forward projection out of WGS84 degrees.
fn from_wgs84(coord: Coord<f64>, to: Crs) -> Result<Coord<f64>> {
    match to {
        Crs::Wgs84 => Ok(coord),
        Crs::WebMercator => Ok(wgs84_to_mercator(coord)),
        Crs::Utm { zone, north } => {
            if coord.y.abs() > MAX_UTM_LATITUDE {
                return Err(EngineError::Reprojection {
                    from: Crs::Wgs84,
                    to,
                    reason: format!("latitude {:.4} exceeds the UTM band", coord.y),
                });
            }
            Ok(wgs84_to_utm(coord, zone, north))
        }
    }
}

/// Convert WGS84 (x=lon, y=lat) to Web Mercator meters.
///
/// Latitude is clamped to the valid Web Mercator range.
#[inline(always)]
pub fn wgs84_to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = coord.x * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;
    Coord { x, y }
}

/// Convert Web Mercator meters to WGS84 (x=lon, y=lat).
#[inline(always)]
pub fn mercator_to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    let lon = coord.x * X_TO_LON_FACTOR;
    let lat = (std::f64::consts::PI / 2.0
        - 2.0 * ((-coord.y * Y_TO_LAT_FACTOR).exp()).atan())
    .to_degrees();
    Coord { x: lon, y: lat }
}

/// Meridian arc length from the equator to latitude `lat_rad`.
fn meridian_arc(lat_rad: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin())
}

/// Convert WGS84 (x=lon, y=lat) to UTM easting/northing in meters.
///
/// Callers are responsible for picking a zone near the data; the series
/// stays accurate to millimeters within a zone and degrades gracefully a few
/// degrees outside it.
pub fn wgs84_to_utm(coord: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let lat_rad = coord.y.to_radians();
    let lon_rad = coord.x.to_radians();
    let lon0_rad = Crs::utm_central_meridian(zone).to_radians();

    let e2 = WGS84_E2;
    let ep2 = e2 / (1.0 - e2);

    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let tan_lat = lat_rad.tan();

    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = ep2 * cos_lat * cos_lat;
    let a = (lon_rad - lon0_rad) * cos_lat;
    let m = meridian_arc(lat_rad);

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let x = UTM_K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + UTM_FALSE_EASTING;
    let mut y = UTM_K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
    if !north {
        y += UTM_FALSE_NORTHING_SOUTH;
    }

    Coord { x, y }
}

/// Convert UTM easting/northing in meters to WGS84 (x=lon, y=lat).
pub fn utm_to_wgs84(coord: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let x = coord.x - UTM_FALSE_EASTING;
    let y = if north {
        coord.y
    } else {
        coord.y - UTM_FALSE_NORTHING_SOUTH
    };

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1me2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = WGS84_A / denom.sqrt();
    let r1 = WGS84_A * (1.0 - e2) / (denom * denom.sqrt());
    let d = x / (n1 * UTM_K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat_rad = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d6
                    / 720.0);
    let lon_rad = Crs::utm_central_meridian(zone).to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

    Coord {
        x: lon_rad.to_degrees(),
        y: lat_rad.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_metric() {
        assert!(!Crs::Wgs84.is_metric());
        assert!(Crs::WebMercator.is_metric());
        assert!(Crs::Utm { zone: 33, north: true }.is_metric());
    }

    #[test]
    fn test_epsg_codes() {
        assert_eq!(Crs::Wgs84.epsg(), 4326);
        assert_eq!(Crs::WebMercator.epsg(), 3857);
        assert_eq!(Crs::Utm { zone: 33, north: true }.epsg(), 32633);
        assert_eq!(Crs::Utm { zone: 19, north: false }.epsg(), 32719);
        assert_eq!(format!("{}", Crs::Wgs84), "EPSG:4326");
    }

    #[test]
    fn test_utm_zone_lookup() {
        // Zone 31 starts at 0° E
        assert_eq!(Crs::utm_for(0.5, 48.0), Crs::Utm { zone: 31, north: true });
        assert_eq!(Crs::utm_for(-0.5, 48.0), Crs::Utm { zone: 30, north: true });
        assert_eq!(
            Crs::utm_for(-70.0, -33.0),
            Crs::Utm { zone: 19, north: false }
        );
        // Antimeridian clamps into the last zone
        assert_eq!(Crs::utm_for(180.0, 0.0), Crs::Utm { zone: 60, north: true });
    }

    #[test]
    fn test_central_meridians() {
        assert!((Crs::utm_central_meridian(31) - 3.0).abs() < f64::EPSILON);
        assert!((Crs::utm_central_meridian(1) - -177.0).abs() < f64::EPSILON);
        assert!((Crs::utm_central_meridian(60) - 177.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mercator_origin_and_bounds() {
        let origin = wgs84_to_mercator(Coord { x: 0.0, y: 0.0 });
        assert!(origin.x.abs() < 0.01);
        assert!(origin.y.abs() < 0.01);

        let west = wgs84_to_mercator(Coord { x: -180.0, y: 0.0 });
        assert!((west.x - EARTH_MERCATOR_MIN).abs() < 1.0);
        let east = wgs84_to_mercator(Coord { x: 180.0, y: 0.0 });
        assert!((east.x - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let input = Coord { x: -0.1278, y: 51.5074 };
        let mercator = wgs84_to_mercator(input);
        let back = mercator_to_wgs84(mercator);
        assert!((back.x - input.x).abs() < 1e-9);
        assert!((back.y - input.y).abs() < 1e-9);
    }

    #[test]
    fn test_utm_central_meridian_identity() {
        // On the central meridian at the equator: false easting, zero northing
        let projected = wgs84_to_utm(Coord { x: 3.0, y: 0.0 }, 31, true);
        assert!((projected.x - UTM_FALSE_EASTING).abs() < 1e-6);
        assert!(projected.y.abs() < 1e-6);
    }

    #[test]
    fn test_utm_roundtrip_northern() {
        let input = Coord { x: 7.4653, y: 51.5135 };
        let zone = 32;
        let projected = wgs84_to_utm(input, zone, true);
        let back = utm_to_wgs84(projected, zone, true);
        assert!((back.x - input.x).abs() < 1e-7);
        assert!((back.y - input.y).abs() < 1e-7);
    }

    #[test]
    fn test_utm_roundtrip_southern() {
        let input = Coord { x: -70.6483, y: -33.4569 };
        let zone = 19;
        let projected = wgs84_to_utm(input, zone, false);
        assert!(projected.y > 0.0);
        let back = utm_to_wgs84(projected, zone, false);
        assert!((back.x - input.x).abs() < 1e-7);
        assert!((back.y - input.y).abs() < 1e-7);
    }

    #[test]
    fn test_utm_scale_near_central_meridian() {
        // One degree of longitude at the equator is about 111.32 km before
        // the 0.9996 central meridian scale is applied.
        let p = wgs84_to_utm(Coord { x: 4.0, y: 0.0 }, 31, true);
        let meters = p.x - UTM_FALSE_EASTING;
        let expected = 111_319.49 * UTM_K0;
        assert!((meters - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_project_identity() {
        let crs = Crs::Utm { zone: 33, north: true };
        let coord = Coord { x: 500_000.0, y: 4_649_776.22 };
        let projected = project(coord, crs, crs).unwrap();
        assert_eq!(projected, coord);
    }

    #[test]
    fn test_project_utm_to_mercator_pivot() {
        let wgs = Coord { x: 13.4050, y: 52.5200 };
        let utm = wgs84_to_utm(wgs, 33, true);
        let via_pivot = project(utm, Crs::Utm { zone: 33, north: true }, Crs::WebMercator).unwrap();
        let direct = wgs84_to_mercator(wgs);
        assert!((via_pivot.x - direct.x).abs() < 1e-3);
        assert!((via_pivot.y - direct.y).abs() < 1e-3);
    }

    #[test]
    fn test_project_rejects_non_finite() {
        let result = project(Coord { x: f64::NAN, y: 0.0 }, Crs::Wgs84, Crs::WebMercator);
        assert!(matches!(result, Err(EngineError::Reprojection { .. })));
    }

    #[test]
    fn test_project_rejects_utm_out_of_band() {
        let result = project(
            Coord { x: 10.0, y: 86.0 },
            Crs::Wgs84,
            Crs::Utm { zone: 32, north: true },
        );
        assert!(matches!(result, Err(EngineError::Reprojection { .. })));
    }

    #[test]
    fn test_metric_for_extent_single_zone() {
        let extent = Rect::new(Coord { x: 12.0, y: 52.0 }, Coord { x: 13.0, y: 53.0 });
        assert_eq!(
            Crs::metric_for_extent(extent).unwrap(),
            Crs::Utm { zone: 33, north: true }
        );
    }

    #[test]
    fn test_metric_for_extent_rejects_zone_span() {
        let extent = Rect::new(Coord { x: 2.0, y: 48.0 }, Coord { x: 9.0, y: 50.0 });
        assert!(matches!(
            Crs::metric_for_extent(extent),
            Err(EngineError::Reprojection { .. })
        ));
    }

    #[test]
    fn test_metric_for_extent_rejects_polar() {
        let extent = Rect::new(Coord { x: 10.0, y: 83.0 }, Coord { x: 11.0, y: 85.0 });
        assert!(matches!(
            Crs::metric_for_extent(extent),
            Err(EngineError::Reprojection { .. })
        ));
    }

    #[test]
    fn test_project_geometry_polygon() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let projected = project_geometry(&Geometry::Polygon(poly), Crs::Wgs84, Crs::WebMercator)
            .unwrap();
        let Geometry::Polygon(projected) = projected else {
            panic!("polygon should stay a polygon");
        };
        let corner = projected.exterior().0[1];
        let expected = wgs84_to_mercator(Coord { x: 1.0, y: 0.0 });
        assert!((corner.x - expected.x).abs() < 1e-6);
        assert!((corner.y - expected.y).abs() < 1e-6);
    }

    #[test]
    fn test_project_geometry_rect_becomes_polygon() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let projected =
            project_geometry(&Geometry::Rect(rect), Crs::Wgs84, Crs::WebMercator).unwrap();
        assert!(matches!(projected, Geometry::Polygon(_)));
    }

    #[test]
    fn test_project_geometry_identity_is_clone() {
        let point = Geometry::Point(Point::new(500_000.0, 0.0));
        let crs = Crs::Utm { zone: 31, north: true };
        let projected = project_geometry(&point, crs, crs).unwrap();
        assert_eq!(projected, point);
    }
}
