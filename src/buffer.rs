//! Multi-ring buffers and area-overlap statistics.
//!
//! Buffers are generated in a metric CRS so radii are honest meters, whatever
//! CRS the source layer arrived in. Overlap statistics always measure against
//! a dissolved polygon set; a buffer kept per-feature is dissolved on the fly
//! before intersection so overlapping rings never double-count.

use crate::aoi::AreaOfInterest;
use crate::crs::{self, Crs};
use crate::layer::FeatureLayer;
use crate::log::{Logger, TracingLogger};
use crate::planar::{self, M2_PER_HECTARE, PlanarOps};
use crate::{EngineError, Result, log_debug, log_info, log_warn};
use geo::{Area, Geometry, MultiPolygon};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A feature layer dilated by one radius.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Buffer {
    /// Radius formatted for reporting, e.g. `"250m"`
    pub label: String,
    pub radius_m: f64,
    /// Metric CRS the buffer was generated in
    pub crs: Crs,
    /// `true` when all features were unioned into one polygon set
    pub dissolved: bool,
    pub geometry: MultiPolygon<f64>,
}

/// Overlap between the AOI and one buffer ring.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapSummary {
    pub buffer_label: String,
    pub overlap_ha: f64,
    pub pct_of_aoi: f64,
}

/// Engine generating buffers and overlap statistics.
pub struct BufferAnalyzer {
    logger: Arc<dyn Logger>,
}

impl Default for BufferAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAnalyzer {
    pub fn new() -> Self {
        Self {
            logger: Arc::new(TracingLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Dilate `layer` by each radius (meters, fractional allowed).
    ///
    /// The layer is brought into its preferred metric CRS first. With
    /// `dissolve` every feature's dilation is unioned into one polygon set
    /// per radius; without it the rings stay per-feature.
    pub fn make_buffers(
        &self,
        layer: &FeatureLayer,
        radii_m: &[f64],
        dissolve: bool,
    ) -> Result<Vec<Buffer>> {
        for radius in radii_m {
            if !radius.is_finite() || *radius <= 0.0 {
                return Err(EngineError::Input(format!(
                    "buffer radius must be a positive number of meters, got {radius}"
                )));
            }
        }
        if layer.measurable_count() == 0 {
            return Err(EngineError::Input(format!(
                "layer '{}' has no measurable geometry to buffer",
                layer.name
            )));
        }

        let metric = layer.metric_crs(self.logger.as_ref())?;
        let layer_m = if layer.crs == Some(metric) {
            layer.clone()
        } else {
            layer.reproject(metric)?
        };
        log_info!(
            self.logger,
            "buffering '{}' ({} features) with {} radii in {}",
            layer_m.name,
            layer_m.measurable_count(),
            radii_m.len(),
            metric
        );

        let buffers = radii_m
            .iter()
            .map(|&radius_m| {
                let dilated = layer_m
                    .measurable()
                    .map(|(_, g)| g.dilate(radius_m));
                let geometry = if dissolve {
                    planar::union_all(dilated)
                } else {
                    MultiPolygon(dilated.flat_map(|mp| mp.0).collect())
                };
                Buffer {
                    label: format!("{radius_m}m"),
                    radius_m,
                    crs: metric,
                    dissolved: dissolve,
                    geometry,
                }
            })
            .collect();
        Ok(buffers)
    }

    /// Overlap between the AOI footprint and each buffer.
    ///
    /// Rows are sorted by descending overlap. A zero-area AOI yields zero
    /// percentages rather than a division error. A buffer that cannot be
    /// represented in the AOI's CRS is measured in Web Mercator instead,
    /// with a logged warning.
    pub fn overlap(
        &self,
        aoi: &AreaOfInterest,
        buffers: &[Buffer],
    ) -> Result<Vec<OverlapSummary>> {
        let aoi_m = aoi.to_metric(self.logger.as_ref())?;
        let footprint = aoi_m.footprint();

        let mut rows = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            let (aligned, base) = self.align_buffer(buffer, &aoi_m, &footprint)?;
            let clean = if buffer.dissolved {
                aligned
            } else {
                planar::union_all(aligned.0.into_iter().map(|p| MultiPolygon(vec![p])))
            };

            let base_area = base.unsigned_area();
            let overlap_m2 = planar::intersection_area(&base, &clean);
            let pct_of_aoi = if base_area > 0.0 {
                overlap_m2 / base_area * 100.0
            } else {
                0.0
            };
            rows.push(OverlapSummary {
                buffer_label: buffer.label.clone(),
                overlap_ha: overlap_m2 / M2_PER_HECTARE,
                pct_of_aoi,
            });
        }
        rows.sort_by(|a, b| b.overlap_ha.total_cmp(&a.overlap_ha));
        log_debug!(
            self.logger,
            "overlap of '{}' against {} buffers computed",
            aoi_m.name(),
            buffers.len()
        );
        Ok(rows)
    }

    /// Buffer geometry and AOI footprint expressed in one CRS.
    ///
    /// The buffer normally moves into the AOI's CRS. When that projection
    /// cannot represent the buffer, both shapes move into Web Mercator so
    /// the row still gets measured.
    fn align_buffer(
        &self,
        buffer: &Buffer,
        aoi_m: &AreaOfInterest,
        footprint: &MultiPolygon<f64>,
    ) -> Result<(MultiPolygon<f64>, MultiPolygon<f64>)> {
        if buffer.crs == aoi_m.crs() {
            return Ok((buffer.geometry.clone(), footprint.clone()));
        }
        let wrapped = Geometry::MultiPolygon(buffer.geometry.clone());
        match crs::project_geometry(&wrapped, buffer.crs, aoi_m.crs()) {
            Ok(projected) => Ok((projected.polygonal(), footprint.clone())),
            Err(err @ EngineError::Reprojection { .. }) => {
                log_warn!(
                    self.logger,
                    "{err}; comparing buffer '{}' with the AOI in {}",
                    buffer.label,
                    Crs::WebMercator
                );
                let buffer_wm = if buffer.crs == Crs::WebMercator {
                    buffer.geometry.clone()
                } else {
                    crs::project_geometry(&wrapped, buffer.crs, Crs::WebMercator)?.polygonal()
                };
                let footprint_wm = crs::project_geometry(
                    &Geometry::MultiPolygon(footprint.clone()),
                    aoi_m.crs(),
                    Crs::WebMercator,
                )?
                .polygonal();
                Ok((buffer_wm, footprint_wm))
            }
            Err(err) => Err(err),
        }
    }
}
