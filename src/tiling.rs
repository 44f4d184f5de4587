//! Tiling and partitioned processing of large AOIs.
//!
//! Tiling is a scaling strategy, never a correctness requirement: results of
//! a tiled run merge back into what a whole-AOI run would produce. The grid
//! covers the AOI's bounding box in a metric CRS; each tile clips the AOI
//! features to an overlap-expanded rectangle and tiles whose clip is empty
//! are never yielded. Per-tile work runs through the configured executor,
//! and a tile failure is either skipped with a logged warning (best effort,
//! the default) or aborts the run (fail fast).

use crate::aoi::AreaOfInterest;
use crate::crs::Crs;
use crate::executor::{CancelToken, Executor};
use crate::layer::Feature;
use crate::log::{Logger, TracingLogger};
use crate::planar::{M2_PER_KM2, PlanarOps};
use crate::{EngineError, Result, log_debug, log_info, log_warn};
use geo::{Area, BooleanOps, BoundingRect, Coord, CoordsIter, Geometry, MultiPolygon, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What happens when a single tile fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailureMode {
    /// Log the failure, record the tile as skipped, keep going.
    #[default]
    BestEffort,
    /// Abort the whole run on the first tile failure.
    FailFast,
}

/// Configuration for the tiling engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilingConfig {
    /// Tile edge length in kilometers. Default: 10.
    pub tile_size_km: f64,
    /// Margin added on every side of a tile's clip rectangle, in kilometers.
    /// Default: 0.
    pub overlap_km: f64,
    /// AOI footprint area above which [`TilingEngine::should_tile`] says
    /// yes, in square kilometers. Default: 100.
    pub aoi_size_threshold_km2: f64,
    /// Master switch; when false `should_tile` is always false. Default: true.
    pub enable_tiling: bool,
    /// Per-tile failure handling. Default: best effort.
    pub failure_mode: FailureMode,
    /// How tiles are dispatched. Default: sequential.
    pub executor: Executor,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_size_km: 10.0,
            overlap_km: 0.0,
            aoi_size_threshold_km2: 100.0,
            enable_tiling: true,
            failure_mode: FailureMode::BestEffort,
            executor: Executor::Sequential,
        }
    }
}

impl TilingConfig {
    pub fn with_tile_size_km(mut self, tile_size_km: f64) -> Self {
        self.tile_size_km = tile_size_km;
        self
    }

    pub fn with_overlap_km(mut self, overlap_km: f64) -> Self {
        self.overlap_km = overlap_km;
        self
    }

    pub fn with_threshold_km2(mut self, threshold_km2: f64) -> Self {
        self.aoi_size_threshold_km2 = threshold_km2;
        self
    }

    pub fn with_enable_tiling(mut self, enable_tiling: bool) -> Self {
        self.enable_tiling = enable_tiling;
        self
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.tile_size_km.is_finite() || self.tile_size_km <= 0.0 {
            return Err(EngineError::Input(format!(
                "tile size must be positive, got {} km",
                self.tile_size_km
            )));
        }
        if !self.overlap_km.is_finite() || self.overlap_km < 0.0 {
            return Err(EngineError::Input(format!(
                "tile overlap must be non-negative, got {} km",
                self.overlap_km
            )));
        }
        Ok(())
    }
}

/// One AOI feature clipped to a tile.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClippedFeature {
    /// Position of the source feature in the AOI layer
    pub source_index: usize,
    pub feature: Feature,
}

/// One rectangular AOI partition with its clipped features.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    /// Grid identifier, `"{i}_{j}"` with `i` the column and `j` the row
    pub id: String,
    pub tile_x: usize,
    pub tile_y: usize,
    /// Clip rectangle including the overlap margin
    pub bounds: Rect<f64>,
    pub crs: Crs,
    /// Non-empty by construction; empty clips are never yielded
    pub features: Vec<ClippedFeature>,
}

/// Output of one per-tile callback.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileResult<R> {
    pub tile_id: String,
    pub tile_x: usize,
    pub tile_y: usize,
    pub output: R,
}

/// A tile dropped by a best-effort run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkippedTile {
    pub tile_id: String,
    pub error: String,
}

/// Outcome of [`TilingEngine::process_tiles`].
///
/// `tile_count` counts yielded tiles, so `results.is_empty()` with a
/// non-empty `skipped` list reads as "everything failed", not "nothing
/// overlapped".
#[derive(Debug, Clone)]
pub struct TileRun<R> {
    pub results: Vec<TileResult<R>>,
    pub skipped: Vec<SkippedTile>,
    pub tile_count: usize,
}

/// Outcome of [`TilingEngine::process_tiles_merged`].
#[derive(Debug, Clone)]
pub struct MergedRun {
    /// Concatenated per-tile features, overlap duplicates removed,
    /// first occurrence kept
    pub features: Vec<Feature>,
    pub skipped: Vec<SkippedTile>,
    pub tile_count: usize,
    pub duplicates_removed: usize,
}

/// Lazy, finite iterator over non-empty tiles.
///
/// Each `next` clips on demand; nothing is precomputed beyond the grid
/// dimensions and per-feature bounding boxes. The iterator is consumed by
/// iteration; a fresh grid comes from calling
/// [`TilingEngine::create_tiles`] again.
pub struct TileGrid {
    subjects: Vec<(usize, Rect<f64>, MultiPolygon<f64>, Feature)>,
    crs: Crs,
    origin: Coord<f64>,
    tile_size_m: f64,
    overlap_m: f64,
    cols: usize,
    rows: usize,
    next_index: usize,
}

impl TileGrid {
    /// Total grid cells, including ones that will clip empty.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn build_tile(&self, i: usize, j: usize) -> Option<Tile> {
        let x0 = self.origin.x + i as f64 * self.tile_size_m;
        let y0 = self.origin.y + j as f64 * self.tile_size_m;
        let bounds = Rect::new(
            Coord {
                x: x0 - self.overlap_m,
                y: y0 - self.overlap_m,
            },
            Coord {
                x: x0 + self.tile_size_m + self.overlap_m,
                y: y0 + self.tile_size_m + self.overlap_m,
            },
        );
        let clip = MultiPolygon(vec![bounds.to_polygon()]);

        let mut features = Vec::new();
        for (source_index, feature_bounds, polygons, feature) in &self.subjects {
            if !rects_intersect(*feature_bounds, bounds) {
                continue;
            }
            // A feature entirely inside the clip rectangle passes through
            // unchanged, which keeps overlap-margin copies byte-identical
            // across tiles for exact deduplication.
            let clipped = if rect_contains(bounds, *feature_bounds) {
                polygons.clone()
            } else {
                polygons.intersection(&clip)
            };
            if clipped.unsigned_area() > 0.0 {
                features.push(ClippedFeature {
                    source_index: *source_index,
                    feature: Feature {
                        geometry: Some(Geometry::MultiPolygon(clipped)),
                        properties: feature.properties.clone(),
                    },
                });
            }
        }
        if features.is_empty() {
            return None;
        }
        Some(Tile {
            id: format!("{i}_{j}"),
            tile_x: i,
            tile_y: j,
            bounds,
            crs: self.crs,
            features,
        })
    }
}

impl Iterator for TileGrid {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        while self.next_index < self.cols * self.rows {
            let i = self.next_index % self.cols;
            let j = self.next_index / self.cols;
            self.next_index += 1;
            if let Some(tile) = self.build_tile(i, j) {
                return Some(tile);
            }
        }
        None
    }
}

fn rects_intersect(a: Rect<f64>, b: Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

fn rect_contains(outer: Rect<f64>, inner: Rect<f64>) -> bool {
    outer.min().x <= inner.min().x
        && outer.min().y <= inner.min().y
        && outer.max().x >= inner.max().x
        && outer.max().y >= inner.max().y
}

/// Engine partitioning AOIs into tiles and running per-tile work.
pub struct TilingEngine {
    config: TilingConfig,
    logger: Arc<dyn Logger>,
    cancel: CancelToken,
}

impl TilingEngine {
    pub fn new(config: TilingConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger),
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether the AOI is large enough to be worth tiling.
    ///
    /// Compares the dissolved footprint area against the configured
    /// threshold; always false when tiling is disabled.
    pub fn should_tile(&self, aoi: &AreaOfInterest) -> Result<bool> {
        if !self.config.enable_tiling {
            return Ok(false);
        }
        let metric = aoi.to_metric(self.logger.as_ref())?;
        let area_km2 = metric.footprint_area() / M2_PER_KM2;
        let decision = area_km2 > self.config.aoi_size_threshold_km2;
        log_debug!(
            self.logger,
            "AOI '{}' spans {:.1} km2 against a {:.1} km2 threshold; tiling {}",
            aoi.name(),
            area_km2,
            self.config.aoi_size_threshold_km2,
            if decision { "applies" } else { "skipped" }
        );
        Ok(decision)
    }

    /// Build the lazy tile grid over the AOI's bounding box.
    ///
    /// Grid dimensions are `ceil(extent / tile_size) + 1` per axis; the
    /// extra row and column clip empty on exactly-divisible extents and are
    /// dropped like any other empty tile.
    pub fn create_tiles(&self, aoi: &AreaOfInterest) -> Result<TileGrid> {
        self.config.validate()?;
        let metric = aoi.to_metric(self.logger.as_ref())?;
        let bbox = metric.bounding_rect();
        let tile_size_m = self.config.tile_size_km * 1000.0;
        let overlap_m = self.config.overlap_km * 1000.0;

        let cols = (bbox.width() / tile_size_m).ceil() as usize + 1;
        let rows = (bbox.height() / tile_size_m).ceil() as usize + 1;

        let subjects = metric
            .layer()
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let geometry = feature.geometry.as_ref()?;
                let feature_bounds = geometry.bounding_rect()?;
                Some((i, feature_bounds, geometry.polygonal(), feature.clone()))
            })
            .collect();

        log_info!(
            self.logger,
            "tiling '{}': {}x{} grid over a {:.1}x{:.1} km bbox (tile {} km, overlap {} km)",
            aoi.name(),
            cols,
            rows,
            bbox.width() / 1000.0,
            bbox.height() / 1000.0,
            self.config.tile_size_km,
            self.config.overlap_km
        );

        Ok(TileGrid {
            subjects,
            crs: metric.crs(),
            origin: bbox.min(),
            tile_size_m,
            overlap_m,
            cols,
            rows,
            next_index: 0,
        })
    }

    /// Run `op` over every tile.
    ///
    /// Sequential runs stream tiles one at a time, checking cancellation at
    /// every tile boundary. Parallel runs stream tiles into the worker pool
    /// in bounded batches, check cancellation between batches and inside
    /// each task, and preserve tile order in the results. Neither executor
    /// holds more than a batch of clipped tiles at once.
    pub fn process_tiles<R, F>(&self, aoi: &AreaOfInterest, op: F) -> Result<TileRun<R>>
    where
        R: Send,
        F: Fn(&Tile) -> Result<R> + Send + Sync,
    {
        let mut grid = self.create_tiles(aoi)?;
        let mut results = Vec::new();
        let mut skipped = Vec::new();
        let mut tile_count = 0usize;

        match self.config.executor {
            Executor::Sequential => {
                for tile in grid {
                    if self.cancel.is_cancelled() {
                        return Err(EngineError::Cancelled);
                    }
                    tile_count += 1;
                    match op(&tile) {
                        Ok(output) => results.push(TileResult {
                            tile_id: tile.id,
                            tile_x: tile.tile_x,
                            tile_y: tile.tile_y,
                            output,
                        }),
                        Err(error) => self.note_failure(tile.id, error, &mut skipped)?,
                    }
                }
            }
            Executor::Parallel => {
                let cancel = self.cancel.clone();
                let batch_size = self.config.executor.batch_size();
                loop {
                    if self.cancel.is_cancelled() {
                        return Err(EngineError::Cancelled);
                    }
                    let batch: Vec<Tile> = grid.by_ref().take(batch_size).collect();
                    if batch.is_empty() {
                        break;
                    }
                    tile_count += batch.len();
                    let outcomes = Executor::Parallel.map_outcomes(batch, |tile| {
                        if cancel.is_cancelled() {
                            return Err((tile.id, EngineError::Cancelled));
                        }
                        match op(&tile) {
                            Ok(output) => Ok(TileResult {
                                tile_id: tile.id,
                                tile_x: tile.tile_x,
                                tile_y: tile.tile_y,
                                output,
                            }),
                            Err(error) => Err((tile.id, error)),
                        }
                    });
                    // The token decides whether Cancelled aborts the run; an
                    // op returning it is an ordinary tile failure.
                    if self.cancel.is_cancelled() {
                        return Err(EngineError::Cancelled);
                    }
                    for outcome in outcomes {
                        match outcome {
                            Ok(result) => results.push(result),
                            Err((tile_id, error)) => {
                                self.note_failure(tile_id, error, &mut skipped)?
                            }
                        }
                    }
                }
            }
        }

        Ok(TileRun {
            results,
            skipped,
            tile_count,
        })
    }

    /// Run `op` over every tile and merge the returned feature collections.
    ///
    /// Features duplicated across overlap margins are removed by exact
    /// geometry equality, keeping the first occurrence.
    pub fn process_tiles_merged<F>(&self, aoi: &AreaOfInterest, op: F) -> Result<MergedRun>
    where
        F: Fn(&Tile) -> Result<Vec<Feature>> + Send + Sync,
    {
        let run = self.process_tiles(aoi, op)?;
        let concatenated: Vec<Feature> = run
            .results
            .into_iter()
            .flat_map(|r| r.output)
            .collect();
        let before = concatenated.len();
        let features = dedup_by_geometry(concatenated);
        let duplicates_removed = before - features.len();
        log_info!(
            self.logger,
            "merged {} features from {} tiles ({} skipped, {} overlap duplicates removed)",
            features.len(),
            run.tile_count,
            run.skipped.len(),
            duplicates_removed
        );
        Ok(MergedRun {
            features,
            skipped: run.skipped,
            tile_count: run.tile_count,
            duplicates_removed,
        })
    }

    fn note_failure(
        &self,
        tile_id: String,
        error: EngineError,
        skipped: &mut Vec<SkippedTile>,
    ) -> Result<()> {
        match self.config.failure_mode {
            FailureMode::FailFast => Err(EngineError::TileProcessing {
                tile_id,
                source: Box::new(error),
            }),
            FailureMode::BestEffort => {
                log_warn!(
                    self.logger,
                    "tile {tile_id} failed: {error}; continuing without it"
                );
                skipped.push(SkippedTile {
                    tile_id,
                    error: error.to_string(),
                });
                Ok(())
            }
        }
    }
}

/// Remove features with exactly equal geometry, keeping first occurrences.
///
/// Equality is coordinate-for-coordinate on the same variant; `-0.0` and
/// `0.0` compare equal. Geometry-less features are never considered
/// duplicates of each other.
pub fn dedup_by_geometry(features: Vec<Feature>) -> Vec<Feature> {
    let mut kept: Vec<Feature> = Vec::with_capacity(features.len());
    let mut seen: HashMap<u64, Vec<usize>> = HashMap::new();
    for feature in features {
        let Some(geometry) = &feature.geometry else {
            kept.push(feature);
            continue;
        };
        let key = geometry_key(geometry);
        let bucket = seen.entry(key).or_default();
        let duplicate = bucket
            .iter()
            .any(|&idx| kept[idx].geometry.as_ref() == Some(geometry));
        if duplicate {
            continue;
        }
        bucket.push(kept.len());
        kept.push(feature);
    }
    kept
}

/// Hash bucket key over variant tag and coordinate bit patterns.
fn geometry_key(geometry: &Geometry<f64>) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    variant_tag(geometry).hash(&mut hasher);
    geometry.coords_count().hash(&mut hasher);
    for coord in geometry.coords_iter() {
        coord_bits(coord.x).hash(&mut hasher);
        coord_bits(coord.y).hash(&mut hasher);
    }
    hasher.finish()
}

fn variant_tag(geometry: &Geometry<f64>) -> u8 {
    match geometry {
        Geometry::Point(_) => 0,
        Geometry::Line(_) => 1,
        Geometry::LineString(_) => 2,
        Geometry::Polygon(_) => 3,
        Geometry::MultiPoint(_) => 4,
        Geometry::MultiLineString(_) => 5,
        Geometry::MultiPolygon(_) => 6,
        Geometry::GeometryCollection(_) => 7,
        Geometry::Rect(_) => 8,
        Geometry::Triangle(_) => 9,
    }
}

fn coord_bits(value: f64) -> u64 {
    // Normalize -0.0 so it buckets with 0.0
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}
