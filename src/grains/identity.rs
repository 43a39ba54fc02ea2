//! IdentitySpace: translation between feature, global and per-phase local ids.
//!
//! The space is built in one deterministic pass. The first time a feature id is
//! seen it receives the next global id and the next local id of its phase, so a
//! given input always produces the same assignment. Once
//! [`finish`](IdentitySpaceBuilder::finish)ed the tables are frozen.
//!
//! Phase numbers are used verbatim: the phase count is `max_phase + 1`, and a
//! phase without grains (typically phase 0 when the data numbers phases from
//! 1) is valid and simply empty.

use hashbrown::HashMap;

use crate::data::point_store::PointStore;
use crate::grain_error::GrainMapError;
use crate::grains::ids::{FeatureId, GlobalId, LocalId, PhaseId};

/// Largest accepted phase count. Phase tables are dense, so a corrupt phase
/// number must not size them.
pub const MAX_PHASE_NUM: usize = 1 << 16;

/// Accumulates grain registrations in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct IdentitySpaceBuilder {
    space: IdentitySpace,
}

impl IdentitySpaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an occurrence of `feature` in `phase`.
    ///
    /// Returns the grain's global id, assigning a new one on first sight.
    ///
    /// # Errors
    /// `ConflictingPhase` if `feature` was first registered with another phase,
    /// `PhaseLimitExceeded` if `phase >= MAX_PHASE_NUM`.
    pub fn register(
        &mut self,
        feature: FeatureId,
        phase: PhaseId,
    ) -> Result<GlobalId, GrainMapError> {
        let space = &mut self.space;
        if let Some(&global) = space.global_id_map.get(&feature) {
            let first = space.phase_of[global.index()];
            if first != phase {
                return Err(GrainMapError::ConflictingPhase {
                    feature,
                    first,
                    found: phase,
                });
            }
            return Ok(global);
        }

        if phase.index() >= MAX_PHASE_NUM {
            return Err(GrainMapError::PhaseLimitExceeded {
                phase,
                limit: MAX_PHASE_NUM,
            });
        }
        let global = GlobalId::new(space.features.len());
        if space.global_id.len() <= phase.index() {
            space.global_id.resize_with(phase.index() + 1, Vec::new);
        }
        let members = &mut space.global_id[phase.index()];
        let local = LocalId::new(members.len());
        members.push(global);

        space.global_id_map.insert(feature, global);
        space.features.push(feature);
        space.phase_of.push(phase);
        space.local_of.push(local);
        Ok(global)
    }

    /// Freeze the registrations.
    pub fn finish(self) -> IdentitySpace {
        log::debug!(
            "identity space frozen: {} grains in {} phases",
            self.space.grain_num(),
            self.space.phase_num()
        );
        self.space
    }
}

/// Frozen feature/global/local id tables.
///
/// # Invariants
/// - `global_id_map` is a bijection between observed feature ids and `0..G`.
/// - `global_id[p][l]` is the global id of local grain `l` of phase `p`, and
///   `local_of[global_id[p][l]] == l`, `phase_of[global_id[p][l]] == p`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdentitySpace {
    global_id_map: HashMap<FeatureId, GlobalId>,
    /// Indexed by global id.
    features: Vec<FeatureId>,
    phase_of: Vec<PhaseId>,
    local_of: Vec<LocalId>,
    /// Indexed by phase, then local id.
    global_id: Vec<Vec<GlobalId>>,
}

impl IdentitySpace {
    /// Single pass over the store in offset order.
    pub fn from_point_store(store: &PointStore) -> Result<Self, GrainMapError> {
        let mut builder = IdentitySpaceBuilder::new();
        for (_, record) in store.iter() {
            builder.register(record.feature_id, record.phase)?;
        }
        Ok(builder.finish())
    }

    /// Total number of grains.
    #[inline]
    pub fn grain_num(&self) -> usize {
        self.features.len()
    }

    /// Number of phases, `max_phase + 1`, empty phases included.
    #[inline]
    pub fn phase_num(&self) -> usize {
        self.global_id.len()
    }

    /// All phases `0..phase_num()`.
    pub fn phases(&self) -> impl Iterator<Item = PhaseId> {
        (0..self.global_id.len() as u32).map(PhaseId::new)
    }

    /// Global ids of the grains in `phase`, indexed by local id.
    pub fn grains_in_phase(&self, phase: PhaseId) -> Result<&[GlobalId], GrainMapError> {
        self.global_id
            .get(phase.index())
            .map(Vec::as_slice)
            .ok_or(GrainMapError::PhaseOutOfRange {
                phase,
                phase_num: self.phase_num(),
            })
    }

    /// Number of grains in `phase`.
    pub fn grain_num_in_phase(&self, phase: PhaseId) -> Result<usize, GrainMapError> {
        Ok(self.grains_in_phase(phase)?.len())
    }

    /// Global id of grain `local_id` of `phase`.
    pub fn global_id(&self, phase: PhaseId, local_id: LocalId) -> Result<GlobalId, GrainMapError> {
        let members = self.grains_in_phase(phase)?;
        members
            .get(local_id.index())
            .copied()
            .ok_or(GrainMapError::LocalIdOutOfRange {
                phase,
                local_id,
                grain_num: members.len(),
            })
    }

    /// Feature id of grain `local_id` of `phase`.
    pub fn feature_id(&self, phase: PhaseId, local_id: LocalId) -> Result<FeatureId, GrainMapError> {
        let global = self.global_id(phase, local_id)?;
        Ok(self.features[global.index()])
    }

    /// Summary slot of a feature id.
    pub fn global_id_of(&self, feature: FeatureId) -> Result<GlobalId, GrainMapError> {
        self.global_id_map
            .get(&feature)
            .copied()
            .ok_or(GrainMapError::UnknownFeature(feature))
    }

    pub fn feature_of(&self, global: GlobalId) -> Result<FeatureId, GrainMapError> {
        self.check_global(global)?;
        Ok(self.features[global.index()])
    }

    pub fn phase_of(&self, global: GlobalId) -> Result<PhaseId, GrainMapError> {
        self.check_global(global)?;
        Ok(self.phase_of[global.index()])
    }

    pub fn local_id_of(&self, global: GlobalId) -> Result<LocalId, GrainMapError> {
        self.check_global(global)?;
        Ok(self.local_of[global.index()])
    }

    /// Errors with `GlobalIdOutOfRange` unless `global < grain_num()`.
    #[inline]
    pub fn check_global(&self, global: GlobalId) -> Result<(), GrainMapError> {
        if global.index() >= self.grain_num() {
            return Err(GrainMapError::GlobalIdOutOfRange {
                id: global,
                grain_num: self.grain_num(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(raw: u32) -> FeatureId {
        FeatureId::new(raw)
    }
    fn p(raw: u32) -> PhaseId {
        PhaseId::new(raw)
    }
    fn l(raw: usize) -> LocalId {
        LocalId::new(raw)
    }

    fn sample() -> IdentitySpace {
        let mut b = IdentitySpaceBuilder::new();
        for (feature, phase) in [(9, 2), (4, 1), (9, 2), (7, 2), (4, 1), (1, 1)] {
            b.register(f(feature), p(phase)).unwrap();
        }
        b.finish()
    }

    #[test]
    fn first_seen_order_assigns_ids() {
        let ids = sample();
        assert_eq!(ids.grain_num(), 4);
        assert_eq!(ids.phase_num(), 3);
        assert_eq!(ids.global_id_of(f(9)).unwrap(), GlobalId::new(0));
        assert_eq!(ids.global_id_of(f(4)).unwrap(), GlobalId::new(1));
        assert_eq!(ids.global_id_of(f(7)).unwrap(), GlobalId::new(2));
        assert_eq!(ids.feature_id(p(2), l(1)).unwrap(), f(7));
        assert_eq!(ids.feature_id(p(1), l(1)).unwrap(), f(1));
        assert_eq!(ids.global_id(p(1), l(1)).unwrap(), GlobalId::new(3));
    }

    #[test]
    fn leading_phase_is_empty_not_an_error() {
        let ids = sample();
        assert_eq!(ids.grain_num_in_phase(p(0)).unwrap(), 0);
        let total: usize = ids
            .phases()
            .map(|ph| ids.grain_num_in_phase(ph).unwrap())
            .sum();
        assert_eq!(total, ids.grain_num());
    }

    #[test]
    fn out_of_range_queries_fail() {
        let ids = sample();
        assert_eq!(
            ids.global_id(p(0), l(0)),
            Err(GrainMapError::LocalIdOutOfRange {
                phase: p(0),
                local_id: l(0),
                grain_num: 0
            })
        );
        assert_eq!(
            ids.feature_id(p(3), l(0)),
            Err(GrainMapError::PhaseOutOfRange {
                phase: p(3),
                phase_num: 3
            })
        );
        assert_eq!(
            ids.global_id_of(f(100)),
            Err(GrainMapError::UnknownFeature(f(100)))
        );
        assert!(matches!(
            ids.phase_of(GlobalId::new(4)),
            Err(GrainMapError::GlobalIdOutOfRange { .. })
        ));
    }

    #[test]
    fn conflicting_phase_is_rejected() {
        let mut b = IdentitySpaceBuilder::new();
        b.register(f(3), p(0)).unwrap();
        assert_eq!(
            b.register(f(3), p(1)),
            Err(GrainMapError::ConflictingPhase {
                feature: f(3),
                first: p(0),
                found: p(1)
            })
        );
    }

    #[test]
    fn huge_phase_numbers_are_rejected() {
        let mut b = IdentitySpaceBuilder::new();
        assert_eq!(
            b.register(f(1), p(u32::MAX)),
            Err(GrainMapError::PhaseLimitExceeded {
                phase: p(u32::MAX),
                limit: MAX_PHASE_NUM
            })
        );
        let last = p(MAX_PHASE_NUM as u32 - 1);
        b.register(f(2), last).unwrap();
        assert_eq!(b.finish().phase_num(), MAX_PHASE_NUM);
    }

    #[test]
    fn reverse_lookups_round_trip() {
        let ids = sample();
        for g in 0..ids.grain_num() {
            let g = GlobalId::new(g);
            let phase = ids.phase_of(g).unwrap();
            let local = ids.local_id_of(g).unwrap();
            assert_eq!(ids.global_id(phase, local).unwrap(), g);
            assert_eq!(ids.feature_id(phase, local).unwrap(), ids.feature_of(g).unwrap());
        }
    }
}
