//! Nearest-distance computation between an AOI layer and target layers.
//!
//! One call builds one R-tree over the target layer and measures every AOI
//! feature against it in fixed-size chunks. Candidates come back from the
//! index in increasing envelope-distance order; the exact geometry distance
//! refines them and the search stops as soon as the envelope lower bound
//! passes the best exact hit, so results are exact, not approximate.
//!
//! Chunking bounds peak memory and is invisible in the output: a feature's
//! distance never depends on which chunk measured it.

use crate::crs::Crs;
use crate::executor::{CancelToken, Executor};
use crate::index::SpatialIndex;
use crate::layer::FeatureLayer;
use crate::log::{Logger, TracingLogger};
use crate::planar::{NearestPair, PlanarOps};
use crate::{EngineError, Result, log_info, log_warn};
use geo::{BoundingRect, Geometry, Line};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of AOI features measured per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Configuration for nearest-distance runs.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProximityConfig {
    /// AOI features measured per chunk. Bounds peak memory only; results are
    /// identical for any chunk size. Default: 5000.
    pub chunk_size: usize,
    /// Record the segment realizing each distance alongside the value.
    /// Default: true.
    pub connectors: bool,
    /// How chunks are processed internally. Default: sequential.
    pub executor: Executor,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            connectors: true,
            executor: Executor::Sequential,
        }
    }
}

impl ProximityConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_connectors(mut self, connectors: bool) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }
}

/// One row per AOI feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceRecord {
    /// Position of the feature in the AOI layer
    pub aoi_index: usize,
    /// Nearest distance in meters; `None` when the feature had no
    /// measurable geometry
    pub distance_m: Option<f64>,
    /// Segment from the AOI feature to the nearest target geometry
    pub connector: Option<Line<f64>>,
}

impl DistanceRecord {
    fn null(aoi_index: usize) -> Self {
        Self {
            aoi_index,
            distance_m: None,
            connector: None,
        }
    }
}

/// Result of one nearest-distance run against one target layer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceTable {
    /// Target layer name; callers assemble one column per label
    pub label: String,
    /// Metric CRS the distances were measured in
    pub crs: Crs,
    /// One record per AOI feature, in AOI order
    pub records: Vec<DistanceRecord>,
}

/// Aggregate statistics over the non-null distances of a table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceStats {
    pub mean: f64,
    pub min: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

/// Summary row for one target layer.
///
/// `stats` is `None` when no feature produced a distance; a target with no
/// usable measurements still yields a row instead of failing the export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceSummary {
    pub label: String,
    pub sample_count: usize,
    pub stats: Option<DistanceStats>,
}

impl DistanceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-null distances in AOI order.
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(|r| r.distance_m)
    }

    /// Aggregate the table into a summary row.
    pub fn summarize(&self) -> DistanceSummary {
        let mut values: Vec<f64> = self.distances().collect();
        values.sort_by(f64::total_cmp);
        if values.is_empty() {
            return DistanceSummary {
                label: self.label.clone(),
                sample_count: 0,
                stats: None,
            };
        }
        let count = values.len();
        let sum: f64 = values.iter().sum();
        DistanceSummary {
            label: self.label.clone(),
            sample_count: count,
            stats: Some(DistanceStats {
                mean: sum / count as f64,
                min: values[0],
                p50: percentile(&values, 0.50),
                p95: percentile(&values, 0.95),
                max: values[count - 1],
            }),
        }
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Engine computing nearest distances from AOI features to target layers.
pub struct ProximityEngine {
    config: ProximityConfig,
    logger: Arc<dyn Logger>,
    cancel: CancelToken,
}

impl ProximityEngine {
    pub fn new(config: ProximityConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Nearest distance from every AOI feature to `target`.
    ///
    /// Both layers are brought into a shared metric CRS first: the AOI's own
    /// CRS when already metric, otherwise the UTM zone of its extent. When
    /// either layer cannot be represented in that choice, both retry in Web
    /// Mercator and the detour is logged as a warning. The resulting table is
    /// labeled with the target layer's name and tagged with the CRS actually
    /// used.
    ///
    /// AOI features without measurable geometry produce a null record; a
    /// target layer without measurable geometry fails the whole call with
    /// [`EngineError::EmptyTargetLayer`].
    pub fn nearest_distances(
        &self,
        aoi: &FeatureLayer,
        target: &FeatureLayer,
    ) -> Result<DistanceTable> {
        if aoi.is_empty() {
            return Err(EngineError::Input(format!(
                "AOI layer '{}' has no features",
                aoi.name
            )));
        }
        aoi.require_crs()?;
        target.require_crs()?;
        if target.measurable_count() == 0 {
            return Err(EngineError::EmptyTargetLayer {
                label: target.name.clone(),
            });
        }

        let preferred = aoi.metric_crs(self.logger.as_ref())?;
        let (metric, aoi_m, target_m) = match align_layers(aoi, target, preferred) {
            Ok((aoi_m, target_m)) => (preferred, aoi_m, target_m),
            Err(err @ EngineError::Reprojection { .. }) if preferred != Crs::WebMercator => {
                log_warn!(
                    self.logger,
                    "{err}; measuring '{}' against '{}' in {} instead",
                    aoi.name,
                    target.name,
                    Crs::WebMercator
                );
                let (aoi_m, target_m) = align_layers(aoi, target, Crs::WebMercator)?;
                (Crs::WebMercator, aoi_m, target_m)
            }
            Err(err) => return Err(err),
        };

        let index = SpatialIndex::build(&target_m)?;
        log_info!(
            self.logger,
            "nearest distances: '{}' ({} features) vs '{}' ({} indexed) in {}",
            aoi_m.name,
            aoi_m.len(),
            target_m.name,
            index.len(),
            metric
        );

        let features: Vec<(usize, Option<&Geometry<f64>>)> = aoi_m
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.geometry.as_ref()))
            .collect();

        let mut records = Vec::with_capacity(features.len());
        for chunk in features.chunks(self.config.chunk_size.max(1)) {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let measured = self.config.executor.map(chunk.to_vec(), |(i, geometry)| {
                Ok::<DistanceRecord, EngineError>(self.measure(i, geometry, &index))
            })?;
            records.extend(measured);
        }

        let nulls = records.iter().filter(|r| r.distance_m.is_none()).count();
        if nulls > 0 {
            log_warn!(
                self.logger,
                "'{}': {nulls} AOI features had no measurable geometry, recorded as null",
                aoi_m.name
            );
        }

        Ok(DistanceTable {
            label: target_m.name.clone(),
            crs: metric,
            records,
        })
    }

    /// Measure one AOI feature against the index.
    fn measure(
        &self,
        aoi_index: usize,
        geometry: Option<&Geometry<f64>>,
        index: &SpatialIndex,
    ) -> DistanceRecord {
        let Some(geometry) = geometry else {
            return DistanceRecord::null(aoi_index);
        };
        let Some(rect) = geometry.bounding_rect() else {
            return DistanceRecord::null(aoi_index);
        };
        let center = rect.center();
        // Any point of the feature lies within half a bbox diagonal of the
        // anchor, so envelope distance minus that radius bounds the true
        // distance from below.
        let half_diagonal = {
            let dx = rect.max().x - center.x;
            let dy = rect.max().y - center.y;
            (dx * dx + dy * dy).sqrt()
        };

        let mut best: Option<NearestPair> = None;
        for (entry, envelope_d2) in index.candidates_by_envelope([center.x, center.y]) {
            let lower_bound = (envelope_d2.sqrt() - half_diagonal).max(0.0);
            if let Some(current) = &best {
                if lower_bound >= current.distance {
                    break;
                }
            }
            let Some(pair) = geometry.nearest_pair(&entry.geometry) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some(current) => pair.distance < current.distance,
            };
            if better {
                best = Some(pair);
            }
        }

        match best {
            Some(pair) => DistanceRecord {
                aoi_index,
                distance_m: Some(pair.distance),
                connector: if self.config.connectors {
                    pair.connector
                } else {
                    None
                },
            },
            None => DistanceRecord::null(aoi_index),
        }
    }
}

/// Both layers expressed in `metric`, reprojecting only where needed.
fn align_layers(
    aoi: &FeatureLayer,
    target: &FeatureLayer,
    metric: Crs,
) -> Result<(FeatureLayer, FeatureLayer)> {
    let aoi_m = if aoi.crs == Some(metric) {
        aoi.clone()
    } else {
        aoi.reproject(metric)?
    };
    let target_m = if target.crs == Some(metric) {
        target.clone()
    } else {
        target.reproject(metric)?
    };
    Ok((aoi_m, target_m))
}
