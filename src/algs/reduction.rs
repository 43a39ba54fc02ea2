//! Reduction of worker-local build results into one process-wide view.
//!
//! When the measurement grid is split across workers, each worker accumulates
//! a [`PartialAggregate`] over its offsets and weighs its own mesh nodes. The
//! functions here fold those fragments together. They are pure: transport of
//! the fragments between workers is left to the caller.

use crate::algs::weights::NodeWeightMaps;
use crate::grain_error::GrainMapError;
use crate::grains::aggregate::PartialAggregate;

/// Fold partial aggregates into one.
///
/// Returns `Ok(None)` for an empty input. The result does not depend on the
/// order of `parts` as far as id assignment is concerned; floating-point sums
/// follow the fold order.
pub fn merge_partial_aggregates<I>(parts: I) -> Result<Option<PartialAggregate>, GrainMapError>
where
    I: IntoIterator<Item = PartialAggregate>,
{
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Ok(None);
    };
    let merged = parts.try_fold(first, PartialAggregate::merge)?;
    log::debug!(
        "merged partial aggregates: {} points, {} grains",
        merged.points(),
        merged.grain_num()
    );
    Ok(Some(merged))
}

/// Union per-worker weight maps over disjoint node sets.
///
/// Returns `Ok(None)` for an empty input.
///
/// # Errors
/// `WeightMapShapeMismatch` if the fragments were built against different grain
/// or phase counts, `DuplicatePoint` if a node appears in two fragments.
pub fn merge_node_weight_maps<I>(parts: I) -> Result<Option<NodeWeightMaps>, GrainMapError>
where
    I: IntoIterator<Item = NodeWeightMaps>,
{
    let mut parts = parts.into_iter();
    let Some(mut merged) = parts.next() else {
        return Ok(None);
    };
    for part in parts {
        if (part.grain_num(), part.phase_num()) != (merged.grain_num(), merged.phase_num()) {
            return Err(GrainMapError::WeightMapShapeMismatch {
                grains_a: merged.grain_num(),
                phases_a: merged.phase_num(),
                grains_b: part.grain_num(),
                phases_b: part.phase_num(),
            });
        }
        for (node, grain, phase) in part.into_entries() {
            merged.insert(node, grain, phase)?;
        }
    }
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::point::PointId;

    fn pid(raw: u64) -> PointId {
        PointId::new(raw).unwrap()
    }

    fn maps(grains: usize, phases: usize, nodes: &[u64]) -> NodeWeightMaps {
        let mut m = NodeWeightMaps::empty(grains, phases);
        for &n in nodes {
            let mut g = vec![0.0; grains];
            g[0] = 1.0;
            let mut p = vec![0.0; phases];
            p[0] = 1.0;
            m.insert(pid(n), g, p).unwrap();
        }
        m
    }

    #[test]
    fn empty_inputs_merge_to_none() {
        assert!(merge_partial_aggregates(Vec::<PartialAggregate>::new()).unwrap().is_none());
        assert!(merge_node_weight_maps(Vec::<NodeWeightMaps>::new()).unwrap().is_none());
    }

    #[test]
    fn weight_maps_union() {
        let merged = merge_node_weight_maps([maps(2, 1, &[1, 3]), maps(2, 1, &[2])])
            .unwrap()
            .unwrap();
        let nodes: Vec<u64> = merged.grain_weights().keys().map(|p| p.get()).collect();
        assert_eq!(nodes, vec![1, 2, 3]);
        assert_eq!(merged.phase_weights().len(), 3);
    }

    #[test]
    fn overlapping_or_mismatched_maps_fail() {
        assert_eq!(
            merge_node_weight_maps([maps(2, 1, &[1]), maps(2, 1, &[1])]),
            Err(GrainMapError::DuplicatePoint(pid(1)))
        );
        assert!(matches!(
            merge_node_weight_maps([maps(2, 1, &[1]), maps(3, 1, &[2])]),
            Err(GrainMapError::WeightMapShapeMismatch { .. })
        ));
    }
}
