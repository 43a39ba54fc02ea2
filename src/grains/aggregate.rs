//! Per-grain averages and the immutable [`GrainMap`] query surface.
//!
//! Aggregation is split in two phases:
//! 1. [`PartialAggregate`] accumulates per-feature sums over some range of grid
//!    offsets. Partials over disjoint ranges combine with
//!    [`PartialAggregate::merge`].
//! 2. [`GrainMap::from_partial`] checks that the partial covers every cell of the
//!    store exactly once and agrees with its records, orders grains by the first
//!    offset at which they were seen, which reproduces the first-seen order of a
//!    single pass over the whole store, builds the [`IdentitySpace`] and divides
//!    sums by counts.
//!
//! [`GrainMap::build`] runs both phases over a full store. Averages are plain
//! arithmetic means of the stored values; angles get no wraparound correction.

use std::ops::Range;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::algs::weights::{NodeWeightMaps, WeightMapOptions, build_node_weight_maps};
use crate::data::coordinates::NodePositions;
use crate::data::point_store::{PointRecord, PointStore};
use crate::geometry::grid::GridGeometry;
use crate::grain_error::GrainMapError;
use crate::grains::access::{
    AvgDataFunctor, PointDataFunctor, avg_data_access_functor, point_data_access_functor,
};
use crate::grains::euler::{EulerAngleProvider, EulerAngles};
use crate::grains::identity::{IdentitySpace, IdentitySpaceBuilder};
use crate::grains::ids::{FeatureId, GlobalId, LocalId, PhaseId};

/// Finalized averages of one grain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrainSummary {
    pub phase: PhaseId,
    pub feature_id: FeatureId,
    pub local_id: LocalId,
    /// Arithmetic mean of the point orientations.
    pub angles: EulerAngles,
    /// Arithmetic mean of each custom column.
    pub custom: Vec<f64>,
    /// Mean of the contributing cell centroids.
    pub centroid: [f64; 3],
    /// Number of grid cells belonging to the grain; always at least 1.
    pub point_count: usize,
}

/// Running sums for one feature.
#[derive(Clone, Debug, PartialEq)]
struct GrainSums {
    feature_id: FeatureId,
    phase: PhaseId,
    first_offset: usize,
    count: usize,
    angles: [f64; 3],
    centroid: [f64; 3],
    custom: Vec<f64>,
}

impl GrainSums {
    fn absorb(&mut self, other: GrainSums) {
        self.first_offset = self.first_offset.min(other.first_offset);
        self.count += other.count;
        add_assign(&mut self.angles, &other.angles);
        add_assign(&mut self.centroid, &other.centroid);
        add_assign(&mut self.custom, &other.custom);
    }
}

#[inline]
fn add_assign(acc: &mut [f64], values: &[f64]) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}

/// Grid offsets accumulated so far, as sorted, disjoint, non-adjacent ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Coverage {
    ranges: Vec<Range<usize>>,
}

impl Coverage {
    /// First offset of `range` that is already covered.
    fn first_overlap(&self, range: &Range<usize>) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let i = self.ranges.partition_point(|r| r.end <= range.start);
        self.ranges
            .get(i)
            .filter(|next| next.start < range.end)
            .map(|next| next.start.max(range.start))
    }

    /// Add a range that does not overlap the covered offsets.
    fn insert(&mut self, range: Range<usize>) {
        debug_assert!(self.first_overlap(&range).is_none());
        if range.is_empty() {
            return;
        }
        let i = self.ranges.partition_point(|r| r.end <= range.start);
        let mut merged = range;
        let mut replace = i..i;
        if i > 0 && self.ranges[i - 1].end == merged.start {
            merged.start = self.ranges[i - 1].start;
            replace.start = i - 1;
        }
        if let Some(next) = self.ranges.get(i) {
            if next.start == merged.end {
                merged.end = next.end;
                replace.end = i + 1;
            }
        }
        self.ranges.splice(replace, std::iter::once(merged));
    }

    /// First offset of `0..len` that is not covered, or `None` when the
    /// coverage is exactly `0..len`.
    fn first_gap(&self, len: usize) -> Option<usize> {
        match self.ranges.as_slice() {
            [only] if only.start == 0 && only.end == len => None,
            [first, ..] if first.start == 0 => Some(first.end.min(len)),
            _ => Some(0),
        }
    }
}

/// Mutable per-feature accumulator over a subset of grid cells.
///
/// Grains are kept in the order they were first accumulated. Every grid
/// offset may be accumulated once; the covered offsets travel with the
/// partial so merged fragments can be checked against the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialAggregate {
    custom_columns: usize,
    points: usize,
    coverage: Coverage,
    grains: Vec<GrainSums>,
    index: HashMap<FeatureId, usize>,
}

impl PartialAggregate {
    pub fn new(custom_columns: usize) -> Self {
        Self {
            custom_columns,
            ..Self::default()
        }
    }

    /// Accumulate over the whole store.
    pub fn from_store(store: &PointStore) -> Result<Self, GrainMapError> {
        Self::from_store_range(store, 0..store.len())
    }

    /// Accumulate over the offsets in `range`.
    ///
    /// # Errors
    /// `OffsetOutOfRange` if the range reaches past the store.
    pub fn from_store_range(store: &PointStore, range: Range<usize>) -> Result<Self, GrainMapError> {
        if range.end > store.len() {
            return Err(GrainMapError::OffsetOutOfRange {
                offset: range.end - 1,
                len: store.len(),
            });
        }
        let geometry = store.geometry();
        let mut partial = Self::new(store.custom_columns());
        for offset in range {
            let centroid = geometry.centroid(offset)?;
            partial.accumulate(offset, centroid, store.record(offset))?;
        }
        Ok(partial)
    }

    /// Add one grid cell.
    ///
    /// # Errors
    /// `CustomColumnMismatch`, `OverlappingCoverage` if `offset` was already
    /// accumulated, or `ConflictingPhase`.
    pub fn accumulate(
        &mut self,
        offset: usize,
        centroid: [f64; 3],
        record: &PointRecord,
    ) -> Result<(), GrainMapError> {
        if record.custom.len() != self.custom_columns {
            return Err(GrainMapError::CustomColumnMismatch {
                offset,
                expected: self.custom_columns,
                found: record.custom.len(),
            });
        }
        let cell = offset..offset + 1;
        if let Some(offset) = self.coverage.first_overlap(&cell) {
            return Err(GrainMapError::OverlappingCoverage { offset });
        }
        let sample = GrainSums {
            feature_id: record.feature_id,
            phase: record.phase,
            first_offset: offset,
            count: 1,
            angles: record.angles.to_array(),
            centroid,
            custom: record.custom.clone(),
        };
        self.absorb(sample)?;
        self.coverage.insert(cell);
        self.points += 1;
        Ok(())
    }

    fn absorb(&mut self, sums: GrainSums) -> Result<(), GrainMapError> {
        match self.index.get(&sums.feature_id) {
            Some(&slot) => {
                let existing = &mut self.grains[slot];
                if existing.phase != sums.phase {
                    return Err(GrainMapError::ConflictingPhase {
                        feature: sums.feature_id,
                        first: existing.phase,
                        found: sums.phase,
                    });
                }
                existing.absorb(sums);
            }
            None => {
                self.index.insert(sums.feature_id, self.grains.len());
                self.grains.push(sums);
            }
        }
        Ok(())
    }

    /// Combine two partials computed over disjoint sets of cells.
    ///
    /// # Errors
    /// `ColumnCountMismatch` if the partials disagree on the column count,
    /// `OverlappingCoverage` if they share a grid cell, `ConflictingPhase` if a
    /// feature carries different phases.
    pub fn merge(mut self, other: PartialAggregate) -> Result<Self, GrainMapError> {
        if self.custom_columns != other.custom_columns {
            return Err(GrainMapError::ColumnCountMismatch {
                expected: self.custom_columns,
                found: other.custom_columns,
            });
        }
        if let Some(offset) = other
            .coverage
            .ranges
            .iter()
            .find_map(|range| self.coverage.first_overlap(range))
        {
            return Err(GrainMapError::OverlappingCoverage { offset });
        }
        for sums in other.grains {
            self.absorb(sums)?;
        }
        for range in other.coverage.ranges {
            self.coverage.insert(range);
        }
        self.points += other.points;
        Ok(self)
    }

    /// Slot of every cell of `store`, in offset order.
    ///
    /// Fails with `ForeignPartial` unless each record's feature is known with the
    /// record's phase and every grain's count and first offset match the store.
    fn cell_slots(&self, store: &PointStore) -> Result<Vec<usize>, GrainMapError> {
        let mut seen = vec![0usize; self.grains.len()];
        let mut first = vec![None; self.grains.len()];
        let mut slots = Vec::with_capacity(store.len());
        for (offset, record) in store.iter() {
            let slot = self
                .index
                .get(&record.feature_id)
                .copied()
                .filter(|&slot| self.grains[slot].phase == record.phase)
                .ok_or(GrainMapError::ForeignPartial { offset })?;
            first[slot].get_or_insert(offset);
            seen[slot] += 1;
            slots.push(slot);
        }
        for (slot, sums) in self.grains.iter().enumerate() {
            if seen[slot] != sums.count || first[slot] != Some(sums.first_offset) {
                let offset = first[slot].map_or(sums.first_offset, |f| f.min(sums.first_offset));
                return Err(GrainMapError::ForeignPartial { offset });
            }
        }
        Ok(slots)
    }

    /// Number of grid cells accumulated.
    #[inline]
    pub fn points(&self) -> usize {
        self.points
    }

    /// Number of distinct features seen.
    #[inline]
    pub fn grain_num(&self) -> usize {
        self.grains.len()
    }

    #[inline]
    pub fn custom_columns(&self) -> usize {
        self.custom_columns
    }
}

/// Immutable grain/phase index over one loaded point store.
///
/// All tables are built before construction returns; the type exposes no
/// mutation, so shared references can be read from many threads. Loading a new
/// file means building a new `GrainMap`.
#[derive(Clone, Debug, PartialEq)]
pub struct GrainMap {
    store: PointStore,
    identity: IdentitySpace,
    summaries: Vec<GrainSummary>,
    /// Global id of the grain of every cell, indexed by offset.
    cell_grain: Vec<GlobalId>,
}

impl GrainMap {
    /// Index `store` in one fused identity/aggregation pass.
    pub fn build(store: PointStore) -> Result<Self, GrainMapError> {
        let partial = PartialAggregate::from_store(&store)?;
        Self::from_partial(store, partial)
    }

    /// Finalize a (possibly merged) partial aggregate covering `store`.
    ///
    /// # Errors
    /// - `IncompletePartial` if the partial does not account for every cell,
    /// - `ColumnCountMismatch` if it was accumulated with another column count,
    /// - `UncoveredCell` if its offsets are not exactly `0..store.len()`,
    /// - `ForeignPartial` if it was accumulated from other records.
    pub fn from_partial(
        store: PointStore,
        partial: PartialAggregate,
    ) -> Result<Self, GrainMapError> {
        if partial.points != store.len() {
            return Err(GrainMapError::IncompletePartial {
                expected: store.len(),
                found: partial.points,
            });
        }
        if partial.custom_columns != store.custom_columns() {
            return Err(GrainMapError::ColumnCountMismatch {
                expected: store.custom_columns(),
                found: partial.custom_columns,
            });
        }
        if let Some(offset) = partial.coverage.first_gap(store.len()) {
            return Err(GrainMapError::UncoveredCell {
                offset,
                len: store.len(),
            });
        }
        let slots = partial.cell_slots(&store)?;

        let mut grains: Vec<(usize, GrainSums)> =
            partial.grains.into_iter().enumerate().collect();
        grains.sort_by_key(|(_, g)| g.first_offset);

        let mut builder = IdentitySpaceBuilder::new();
        let mut slot_global = vec![GlobalId::new(0); grains.len()];
        let mut ordered = Vec::with_capacity(grains.len());
        for (slot, sums) in grains {
            let global = builder.register(sums.feature_id, sums.phase)?;
            debug_assert_eq!(global.index(), ordered.len());
            slot_global[slot] = global;
            ordered.push(sums);
        }
        let identity = builder.finish();

        let summaries = ordered
            .into_iter()
            .enumerate()
            .map(|(g, sums)| finalize(&identity, GlobalId::new(g), sums))
            .collect::<Result<Vec<_>, _>>()?;
        let cell_grain = slots.into_iter().map(|slot| slot_global[slot]).collect();

        log::debug!(
            "grain map built: {} cells, {} grains, {} phases",
            store.len(),
            identity.grain_num(),
            identity.phase_num()
        );
        Ok(Self {
            store,
            identity,
            summaries,
            cell_grain,
        })
    }

    /// Point record of the grid cell containing `p`.
    #[inline]
    pub fn data(&self, p: &[f64; 3]) -> &PointRecord {
        self.store.at_point(p)
    }

    /// Global id of the grain owning the cell at `offset`.
    pub fn global_id_of_cell(&self, offset: usize) -> Result<GlobalId, GrainMapError> {
        self.cell_grain
            .get(offset)
            .copied()
            .ok_or(GrainMapError::OffsetOutOfRange {
                offset,
                len: self.cell_grain.len(),
            })
    }

    /// Grain of a cell offset produced by the grid geometry.
    #[inline]
    pub(crate) fn cell_grain(&self, offset: usize) -> GlobalId {
        self.cell_grain[offset]
    }

    /// Average data of grain `global`.
    pub fn avg_data(&self, global: GlobalId) -> Result<&GrainSummary, GrainMapError> {
        self.identity.check_global(global)?;
        Ok(&self.summaries[global.index()])
    }

    /// Average data of grain `local_id` of `phase`.
    pub fn avg_data_in_phase(
        &self,
        phase: PhaseId,
        local_id: LocalId,
    ) -> Result<&GrainSummary, GrainMapError> {
        let global = self.identity.global_id(phase, local_id)?;
        Ok(&self.summaries[global.index()])
    }

    #[inline]
    pub fn grain_num(&self) -> usize {
        self.identity.grain_num()
    }

    pub fn grain_num_in_phase(&self, phase: PhaseId) -> Result<usize, GrainMapError> {
        self.identity.grain_num_in_phase(phase)
    }

    #[inline]
    pub fn phase_num(&self) -> usize {
        self.identity.phase_num()
    }

    pub fn feature_id(&self, phase: PhaseId, local_id: LocalId) -> Result<FeatureId, GrainMapError> {
        self.identity.feature_id(phase, local_id)
    }

    pub fn global_id(&self, phase: PhaseId, local_id: LocalId) -> Result<GlobalId, GrainMapError> {
        self.identity.global_id(phase, local_id)
    }

    #[inline]
    pub fn identity(&self) -> &IdentitySpace {
        &self.identity
    }

    /// All grain summaries indexed by global id.
    #[inline]
    pub fn summaries(&self) -> &[GrainSummary] {
        &self.summaries
    }

    #[inline]
    pub fn point_store(&self) -> &PointStore {
        &self.store
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        self.store.geometry()
    }

    #[inline]
    pub fn custom_columns(&self) -> usize {
        self.store.custom_columns()
    }

    /// Functor reading the point field called `name`.
    pub fn point_data_access_functor(
        &self,
        name: &str,
    ) -> Result<Arc<dyn PointDataFunctor>, GrainMapError> {
        point_data_access_functor(name, self.custom_columns())
    }

    /// Functor reading the average field called `name`.
    pub fn avg_data_access_functor(
        &self,
        name: &str,
    ) -> Result<Arc<dyn AvgDataFunctor>, GrainMapError> {
        avg_data_access_functor(name, self.custom_columns())
    }

    /// Grain and phase weights for every node of `nodes`.
    pub fn node_weight_maps<P>(
        &self,
        nodes: &P,
        options: &WeightMapOptions,
    ) -> Result<NodeWeightMaps, GrainMapError>
    where
        P: NodePositions + ?Sized,
    {
        build_node_weight_maps(self, nodes, options)
    }
}

fn finalize(
    identity: &IdentitySpace,
    global: GlobalId,
    sums: GrainSums,
) -> Result<GrainSummary, GrainMapError> {
    let n = sums.count as f64;
    let mean = |values: &mut [f64]| values.iter_mut().for_each(|v| *v /= n);

    let mut angles = sums.angles;
    mean(&mut angles[..]);
    let mut centroid = sums.centroid;
    mean(&mut centroid[..]);
    let mut custom = sums.custom;
    mean(&mut custom[..]);

    Ok(GrainSummary {
        phase: sums.phase,
        feature_id: sums.feature_id,
        local_id: identity.local_id_of(global)?,
        angles: EulerAngles::from_array(angles),
        custom,
        centroid,
        point_count: sums.count,
    })
}

impl EulerAngleProvider for GrainMap {
    fn euler_angles(&self, grain: GlobalId) -> Result<&EulerAngles, GrainMapError> {
        Ok(&self.avg_data(grain)?.angles)
    }

    fn grain_num(&self) -> usize {
        self.identity.grain_num()
    }
}
