//! Vector feature layers.
//!
//! A [`FeatureLayer`] is the engine's unit of input: a named collection of
//! features with an explicit CRS. Layers are read-only once loaded; every
//! transformation (reprojection, clipping) produces a new layer and leaves
//! the source untouched. Attributes ride along as opaque GeoJSON-style maps
//! and are never interpreted here.

use crate::crs::{self, Crs};
use crate::log::Logger;
use crate::{EngineError, Result, log_warn};
use geo::{BoundingRect, Coord, CoordsIter, Geometry, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque attribute map attached to a feature.
pub type Properties = Map<String, Value>;

/// A single vector feature: optional geometry plus attributes.
///
/// `geometry` is `None` for features whose source record carried no usable
/// shape. Such features stay in the layer (their attributes may matter to
/// the caller) but are skipped by every measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Properties,
}

impl Feature {
    /// Create a feature from a geometry with empty attributes.
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    /// Create a geometry-less feature (attributes only).
    pub fn without_geometry() -> Self {
        Self {
            geometry: None,
            properties: Properties::new(),
        }
    }

    /// Attach attributes, builder style.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Whether this feature carries at least one coordinate to measure.
    pub fn has_geometry(&self) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|g| g.coords_count() > 0)
    }
}

/// A named, CRS-tagged collection of features.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureLayer {
    /// Dataset label used in diagnostics and result tables
    pub name: String,
    /// CRS of every geometry in `features`; `None` until known
    pub crs: Option<Crs>,
    pub features: Vec<Feature>,
}

impl FeatureLayer {
    /// Create an empty layer.
    pub fn new(name: impl Into<String>, crs: Option<Crs>) -> Self {
        Self {
            name: name.into(),
            crs,
            features: Vec::new(),
        }
    }

    /// Create a layer from bare geometries with empty attributes.
    pub fn from_geometries(
        name: impl Into<String>,
        crs: Crs,
        geometries: impl IntoIterator<Item = Geometry<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            crs: Some(crs),
            features: geometries.into_iter().map(Feature::new).collect(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The layer's CRS, or an input error naming the layer if unset.
    pub fn require_crs(&self) -> Result<Crs> {
        self.crs
            .ok_or_else(|| EngineError::Input(format!("layer '{}' has no CRS", self.name)))
    }

    /// Indexed iterator over features that carry a measurable geometry.
    pub fn measurable(&self) -> impl Iterator<Item = (usize, &Geometry<f64>)> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match &f.geometry {
                Some(g) if g.coords_count() > 0 => Some((i, g)),
                _ => None,
            })
    }

    /// Number of features with a measurable geometry.
    pub fn measurable_count(&self) -> usize {
        self.features.iter().filter(|f| f.has_geometry()).count()
    }

    /// Bounding rectangle over all measurable geometries.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let mut bounds: Option<Rect<f64>> = None;
        for (_, geometry) in self.measurable() {
            let Some(rect) = geometry.bounding_rect() else {
                continue;
            };
            bounds = Some(match bounds {
                None => rect,
                Some(acc) => Rect::new(
                    Coord {
                        x: acc.min().x.min(rect.min().x),
                        y: acc.min().y.min(rect.min().y),
                    },
                    Coord {
                        x: acc.max().x.max(rect.max().x),
                        y: acc.max().y.max(rect.max().y),
                    },
                ),
            });
        }
        bounds
    }

    /// Reproject every geometry into `to`, returning a new layer.
    ///
    /// Fails with [`EngineError::Reprojection`] if the target CRS cannot
    /// represent some coordinate. Geometry-less features pass through.
    pub fn reproject(&self, to: Crs) -> Result<FeatureLayer> {
        let from = self.require_crs()?;
        let features = self
            .features
            .iter()
            .map(|f| {
                let geometry = match &f.geometry {
                    Some(g) => Some(crs::project_geometry(g, from, to)?),
                    None => None,
                };
                Ok(Feature {
                    geometry,
                    properties: f.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureLayer {
            name: self.name.clone(),
            crs: Some(to),
            features,
        })
    }

    /// Metric CRS this layer should be measured in.
    ///
    /// Reuses the layer's own CRS when it is already metric. Geographic
    /// layers get the UTM zone of their extent; when UTM cannot represent
    /// the extent (zone span, polar latitudes) the engine degrades to Web
    /// Mercator and logs a warning rather than failing the run.
    pub fn metric_crs(&self, logger: &dyn Logger) -> Result<Crs> {
        let crs = self.require_crs()?;
        if crs.is_metric() {
            return Ok(crs);
        }
        let extent = self.bounding_rect().ok_or_else(|| {
            EngineError::Input(format!(
                "layer '{}' has no coordinates to derive an extent from",
                self.name
            ))
        })?;
        match Crs::metric_for_extent(extent) {
            Ok(utm) => Ok(utm),
            Err(err) => {
                log_warn!(
                    logger,
                    "layer '{}': {}; measuring in {} instead",
                    self.name,
                    err,
                    Crs::WebMercator
                );
                Ok(Crs::WebMercator)
            }
        }
    }
}
