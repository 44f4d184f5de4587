//! R-tree spatial index over a feature layer.
//!
//! The index is built once per proximity call with [`rstar::RTree::bulk_load`]
//! and never mutated afterwards, so any number of threads may query it
//! concurrently. Envelope distances returned by the candidate iterator are
//! lower bounds for true geometry distances, which is what makes the
//! branch-and-bound refinement in the proximity engine exact.

use crate::layer::FeatureLayer;
use crate::{EngineError, Result};
use geo::{BoundingRect, Geometry};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// R-tree entry: one indexable geometry plus its position in the source layer.
#[derive(Debug, Clone)]
pub struct IndexedFeature {
    /// Index into the source layer's feature list
    pub source_index: usize,
    pub geometry: Geometry<f64>,
    bounds: AABB<[f64; 2]>,
}

impl IndexedFeature {
    /// Wrap a geometry for indexing; `None` when it has no bounding box.
    fn new(source_index: usize, geometry: Geometry<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let bounds =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        Some(Self {
            source_index,
            geometry,
            bounds,
        })
    }
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl PointDistance for IndexedFeature {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.bounds.distance_2(point)
    }
}

/// Read-only spatial index over the measurable geometries of one layer.
pub struct SpatialIndex {
    tree: RTree<IndexedFeature>,
}

impl SpatialIndex {
    /// Bulk-load every measurable geometry of `layer`.
    ///
    /// Fails with [`EngineError::EmptyTargetLayer`] when the layer holds
    /// nothing indexable, so callers can tell an unusable target apart from
    /// one that is merely far away.
    pub fn build(layer: &FeatureLayer) -> Result<Self> {
        let entries: Vec<IndexedFeature> = layer
            .measurable()
            .filter_map(|(i, g)| IndexedFeature::new(i, g.clone()))
            .collect();
        if entries.is_empty() {
            return Err(EngineError::EmptyTargetLayer {
                label: layer.name.clone(),
            });
        }
        Ok(Self {
            tree: RTree::bulk_load(entries),
        })
    }

    /// Number of indexed geometries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Always false in practice since [`SpatialIndex::build`] rejects
    /// layers with nothing indexable.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Candidates in increasing envelope-distance order from `anchor`.
    ///
    /// The second tuple element is the squared distance from `anchor` to the
    /// entry's envelope.
    pub fn candidates_by_envelope(
        &self,
        anchor: [f64; 2],
    ) -> impl Iterator<Item = (&IndexedFeature, f64)> {
        self.tree.nearest_neighbor_iter_with_distance_2(&anchor)
    }

    /// Entries whose envelope intersects `bounds`.
    pub fn in_envelope(&self, bounds: AABB<[f64; 2]>) -> impl Iterator<Item = &IndexedFeature> {
        self.tree.locate_in_envelope_intersecting(&bounds)
    }
}
