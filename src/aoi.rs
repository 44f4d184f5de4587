//! Validated areas of interest.
//!
//! An [`AreaOfInterest`] is a feature layer that passed polygon validation:
//! CRS attached, at least one feature, and every feature carrying positive
//! polygonal area after cleaning. Cleaning drops consecutive duplicate
//! coordinates and degenerate rings; it does not attempt to repair
//! self-intersecting rings. Validation errors name the offending feature
//! index.

use crate::crs::Crs;
use crate::layer::{Feature, FeatureLayer};
use crate::log::Logger;
use crate::planar::{self, PlanarOps};
use crate::{EngineError, Result};
use geo::{Area, Coord, CoordsIter, Geometry, LineString, MultiPolygon, Polygon, Rect};

/// A cleaned, validated polygonal layer.
///
/// Feature geometries are normalized to `MultiPolygon` during validation,
/// whatever polygonal variant they arrived as.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    layer: FeatureLayer,
    crs: Crs,
    bounds: Rect<f64>,
}

impl AreaOfInterest {
    /// Validate and clean a polygonal layer.
    ///
    /// Fails with [`EngineError::Input`] when the layer has no CRS, no
    /// features, or any feature without positive polygonal area.
    pub fn new(layer: FeatureLayer) -> Result<Self> {
        let crs = layer.require_crs()?;
        if layer.is_empty() {
            return Err(EngineError::Input(format!(
                "AOI layer '{}' has no features",
                layer.name
            )));
        }

        let mut features = Vec::with_capacity(layer.features.len());
        for (i, feature) in layer.features.iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                return Err(EngineError::Input(format!(
                    "AOI feature {i} of '{}' has no geometry",
                    layer.name
                )));
            };
            let polygons = geometry.polygonal();
            if polygons.0.is_empty() {
                return Err(EngineError::Input(format!(
                    "AOI feature {i} of '{}' is not polygonal",
                    layer.name
                )));
            }
            let cleaned = clean_multi_polygon(&polygons);
            if cleaned.unsigned_area() <= 0.0 {
                return Err(EngineError::Input(format!(
                    "AOI feature {i} of '{}' has zero area after cleaning",
                    layer.name
                )));
            }
            features.push(Feature {
                geometry: Some(Geometry::MultiPolygon(cleaned)),
                properties: feature.properties.clone(),
            });
        }

        let cleaned_layer = FeatureLayer {
            name: layer.name,
            crs: Some(crs),
            features,
        };
        let bounds = cleaned_layer.bounding_rect().ok_or_else(|| {
            EngineError::Input(format!(
                "AOI layer '{}' has no coordinates",
                cleaned_layer.name
            ))
        })?;

        Ok(Self {
            layer: cleaned_layer,
            crs,
            bounds,
        })
    }

    pub fn name(&self) -> &str {
        &self.layer.name
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// The cleaned underlying layer.
    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    pub fn feature_count(&self) -> usize {
        self.layer.len()
    }

    /// Bounding rectangle over all features, in the AOI's CRS.
    pub fn bounding_rect(&self) -> Rect<f64> {
        self.bounds
    }

    /// Dissolved footprint of all features.
    ///
    /// Overlapping features count once, so the footprint area is the right
    /// denominator for percent-of-AOI statistics.
    pub fn footprint(&self) -> MultiPolygon<f64> {
        planar::union_all(self.layer.measurable().map(|(_, g)| g.polygonal()))
    }

    /// Area of the dissolved footprint, in squared CRS units.
    pub fn footprint_area(&self) -> f64 {
        self.footprint().unsigned_area()
    }

    /// Reproject into `to`, revalidating the result.
    pub fn reproject(&self, to: Crs) -> Result<AreaOfInterest> {
        AreaOfInterest::new(self.layer.reproject(to)?)
    }

    /// Reproject into the preferred metric CRS (see
    /// [`FeatureLayer::metric_crs`]). Identity when already metric.
    pub fn to_metric(&self, logger: &dyn Logger) -> Result<AreaOfInterest> {
        let metric = self.layer.metric_crs(logger)?;
        if metric == self.crs {
            return Ok(self.clone());
        }
        self.reproject(metric)
    }
}

fn clean_multi_polygon(polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon(polygons.0.iter().filter_map(clean_polygon).collect())
}

/// Drop duplicate consecutive coordinates and degenerate rings.
fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .filter_map(clean_ring)
        .filter(|ring| Polygon::new(ring.clone(), vec![]).unsigned_area() > 0.0)
        .collect();
    let cleaned = Polygon::new(exterior, interiors);
    (cleaned.unsigned_area() > 0.0).then_some(cleaned)
}

/// A cleaned ring is closed, finite and keeps at least a triangle.
fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.coords_count());
    for coord in &ring.0 {
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return None;
        }
        if coords.last() != Some(coord) {
            coords.push(*coord);
        }
    }
    if coords.len() >= 2 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    let first = coords[0];
    coords.push(first);
    Some(LineString(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        ))
    }

    fn aoi_layer(geometries: Vec<Geometry<f64>>) -> FeatureLayer {
        FeatureLayer::from_geometries("aoi", Crs::WebMercator, geometries)
    }

    #[test]
    fn test_valid_aoi_constructs() {
        let aoi = AreaOfInterest::new(aoi_layer(vec![square(0.0, 0.0, 100.0)])).unwrap();
        assert_eq!(aoi.feature_count(), 1);
        assert_eq!(aoi.crs(), Crs::WebMercator);
        assert_eq!(aoi.bounding_rect().max(), Coord { x: 100.0, y: 100.0 });
        assert!((aoi.footprint_area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_features_normalize_to_multi_polygon() {
        let rect = Geometry::Rect(Rect::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
        ));
        let aoi = AreaOfInterest::new(aoi_layer(vec![rect])).unwrap();
        assert!(matches!(
            aoi.layer().features[0].geometry,
            Some(Geometry::MultiPolygon(_))
        ));
    }

    #[test]
    fn test_rejects_missing_crs() {
        let layer = FeatureLayer::new("aoi", None);
        assert!(matches!(
            AreaOfInterest::new(layer),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn test_rejects_empty_layer() {
        let layer = FeatureLayer::new("aoi", Some(Crs::WebMercator));
        assert!(matches!(
            AreaOfInterest::new(layer),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn test_rejects_geometry_less_feature() {
        let mut layer = aoi_layer(vec![square(0.0, 0.0, 10.0)]);
        layer.push(Feature::without_geometry());
        let err = AreaOfInterest::new(layer).unwrap_err();
        assert!(err.to_string().contains("feature 1"));
    }

    #[test]
    fn test_rejects_non_polygonal_feature() {
        let layer = aoi_layer(vec![Geometry::Point(Point::new(0.0, 0.0))]);
        assert!(matches!(
            AreaOfInterest::new(layer),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn test_rejects_zero_area_polygon() {
        // All vertices collinear
        let degenerate = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)]),
            vec![],
        ));
        assert!(matches!(
            AreaOfInterest::new(aoi_layer(vec![degenerate])),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn test_cleaning_removes_duplicate_coordinates() {
        let messy = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        ));
        let aoi = AreaOfInterest::new(aoi_layer(vec![messy])).unwrap();
        let Some(Geometry::MultiPolygon(mp)) = &aoi.layer().features[0].geometry else {
            panic!("cleaned feature should be a multi polygon");
        };
        assert_eq!(mp.0[0].exterior().coords_count(), 5);
        assert!((aoi.footprint_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cleaning_drops_degenerate_hole() {
        let with_bad_hole = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (2.0, 2.0),
                (3.0, 3.0),
                (2.0, 2.0),
            ])],
        ));
        let aoi = AreaOfInterest::new(aoi_layer(vec![with_bad_hole])).unwrap();
        assert!((aoi.footprint_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_footprint_dissolves_overlaps() {
        let aoi = AreaOfInterest::new(aoi_layer(vec![
            square(0.0, 0.0, 2.0),
            square(1.0, 0.0, 2.0),
        ]))
        .unwrap();
        assert!((aoi.footprint_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_reproject_revalidates() {
        let layer = FeatureLayer::from_geometries("aoi", Crs::Wgs84, vec![square(13.0, 52.0, 0.1)]);
        let aoi = AreaOfInterest::new(layer).unwrap();
        let metric = aoi
            .reproject(Crs::Utm { zone: 33, north: true })
            .unwrap();
        assert_eq!(metric.crs(), Crs::Utm { zone: 33, north: true });
        // Roughly 0.1 deg x 0.1 deg near Berlin, must be millions of m2
        assert!(metric.footprint_area() > 1.0e6);
    }

    #[test]
    fn test_to_metric_identity_for_metric_aoi() {
        use crate::log::NoOpLogger;
        let aoi = AreaOfInterest::new(aoi_layer(vec![square(0.0, 0.0, 10.0)])).unwrap();
        let metric = aoi.to_metric(&NoOpLogger).unwrap();
        assert_eq!(metric.crs(), Crs::WebMercator);
        assert_eq!(metric.feature_count(), 1);
    }
}
