//! AOI Proximity - Geospatial Proximity, Buffering and Tiling for Site Assessment
//!
//! This library computes how far an area of interest (AOI) sits from
//! environmental target layers (wells, pipelines, wetlands, protected areas),
//! builds metric distance buffers with overlap shares, and partitions large
//! AOIs into tiles whose per-tile results merge back into whole-AOI answers.
//! All measurement happens in planar meters: layers are reprojected into an
//! automatically selected metric CRS before any distance or area is taken.
//!
//! # Architecture
//!
//! - **[`FeatureLayer`]**: CRS-tagged feature collections with JSON attribute tables
//! - **[`AreaOfInterest`]**: validated polygonal study areas, cleaned on construction
//! - **[`ProximityEngine`]**: nearest-distance tables backed by an R-tree index
//! - **[`BufferAnalyzer`]**: metric distance buffers and AOI overlap summaries
//! - **[`TilingEngine`]**: grid partitioning with best-effort or fail-fast tile runs
//!
//! # Performance Characteristics
//!
//! - **Index Build**: O(N log N) bulk load over the target layer
//! - **Distance Query**: branch-and-bound over bounding-box distances, exact for
//!   piecewise-linear geometries
//! - **Tiling**: lazy grid iteration; runs hold at most one dispatch batch of
//!   clipped tiles at a time

pub mod aoi;
pub mod buffer;
pub mod crs;
pub mod executor;
pub mod index;
pub mod layer;
pub mod log;
pub mod planar;
pub mod proximity;
pub mod tiling;

// Public API exports
pub use aoi::AreaOfInterest;
pub use buffer::{Buffer, BufferAnalyzer, OverlapSummary};
pub use crs::Crs;
pub use executor::{CancelToken, Executor};
pub use index::SpatialIndex;
pub use layer::{Feature, FeatureLayer, Properties};
pub use log::{LogLevel, Logger, NoOpLogger, TracingLogger};
pub use planar::{NearestPair, PlanarOps};
pub use proximity::{
    DistanceRecord, DistanceStats, DistanceSummary, DistanceTable, ProximityConfig,
    ProximityEngine,
};
pub use tiling::{
    ClippedFeature, FailureMode, MergedRun, SkippedTile, Tile, TileGrid, TileResult, TileRun,
    TilingConfig, TilingEngine,
};

/// Error types for the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("target layer '{label}' has no measurable geometries")]
    EmptyTargetLayer { label: String },

    #[error("cannot reproject from {from} to {to}: {reason}")]
    Reprojection { from: Crs, to: Crs, reason: String },

    #[error("tile {tile_id} failed: {source}")]
    TileProcessing {
        tile_id: String,
        source: Box<EngineError>,
    },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
