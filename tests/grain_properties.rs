//! Property tests over randomly generated grids and grain layouts.
mod util;
use approx::assert_relative_eq;
use grain_map::algs::weights::{Kernel, Neighborhood, WeightMapOptions, build_node_weight_maps};
use grain_map::data::point_store::PointStore;
use grain_map::geometry::grid::GridGeometry;
use grain_map::grains::aggregate::GrainMap;
use grain_map::grains::ids::{GlobalId, LocalId};
use proptest::prelude::*;
use std::collections::BTreeSet;
use util::*;

prop_compose! {
    fn arb_grid()(
        dimension in 1usize..=3,
        nx in 1usize..6,
        ny in 1usize..5,
        nz in 1usize..4,
        origin in prop::array::uniform3(-10.0f64..10.0),
        spacing in prop::array::uniform3(0.1f64..3.0),
    ) -> GridGeometry {
        let counts = match dimension {
            1 => [nx, 1, 1],
            2 => [nx, ny, 1],
            _ => [nx, ny, nz],
        };
        GridGeometry::try_new(dimension, origin, spacing, counts).unwrap()
    }
}

prop_compose! {
    /// Store whose feature `f` always lives in phase `f % 3 + 1`.
    fn arb_store()(grid in arb_grid())(
        features in prop::collection::vec(0u32..8, grid.len()),
        grid in Just(grid),
    ) -> PointStore {
        let records = features
            .iter()
            .enumerate()
            .map(|(i, &f)| rec(f % 3 + 1, f, i as f64))
            .collect();
        PointStore::try_new(grid, 0, records).unwrap()
    }
}

proptest! {
    #[test]
    fn centroids_index_back_to_their_cell(grid in arb_grid()) {
        for offset in 0..grid.len() {
            let c = grid.centroid(offset).unwrap();
            prop_assert_eq!(grid.index_from_point(&c), offset);
        }
    }

    #[test]
    fn identity_round_trips(store in arb_store()) {
        let distinct: BTreeSet<u32> = store.iter().map(|(_, r)| r.feature_id.get()).collect();
        let map = GrainMap::build(store).unwrap();
        let ids = map.identity();
        prop_assert_eq!(map.grain_num(), distinct.len());

        let mut total = 0;
        for phase in ids.phases() {
            let n = map.grain_num_in_phase(phase).unwrap();
            total += n;
            for l in 0..n {
                let local = LocalId::new(l);
                let global = map.global_id(phase, local).unwrap();
                prop_assert_eq!(ids.phase_of(global).unwrap(), phase);
                prop_assert_eq!(ids.local_id_of(global).unwrap(), local);
                prop_assert_eq!(
                    map.feature_id(phase, local).unwrap(),
                    ids.feature_of(global).unwrap()
                );
                prop_assert_eq!(ids.global_id_of(ids.feature_of(global).unwrap()).unwrap(), global);
            }
        }
        prop_assert_eq!(total, map.grain_num());

        let counted: usize = map.summaries().iter().map(|s| s.point_count).sum();
        prop_assert_eq!(counted, map.point_store().len());
        for g in 0..map.grain_num() {
            prop_assert_eq!(map.summaries()[g].feature_id, ids.feature_of(GlobalId::new(g)).unwrap());
        }
    }

    #[test]
    fn weights_sum_to_one(
        store in arb_store(),
        nodes in prop::collection::vec(prop::array::uniform3(-12.0f64..25.0), 0..12),
        radius in 0.05f64..4.0,
        gaussian in any::<bool>(),
    ) {
        let map = GrainMap::build(store).unwrap();
        let nodes: Vec<_> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, p)| (pid(i as u64 + 1), p))
            .collect();
        let kernel = if gaussian { Kernel::Gaussian { sigma: radius } } else { Kernel::Uniform };
        let options = WeightMapOptions { neighborhood: Neighborhood::Radius(radius), kernel };
        let w = build_node_weight_maps(&map, &nodes, &options).unwrap();
        prop_assert!(w.len() <= nodes.len());
        for (node, grain) in w.grain_weights() {
            prop_assert_eq!(grain.len(), map.grain_num());
            prop_assert!(grain.iter().all(|&x| x >= 0.0));
            assert_relative_eq!(grain.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            let phase = w.phase_weights_of(*node).unwrap();
            prop_assert_eq!(phase.len(), map.phase_num());
            assert_relative_eq!(phase.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn rebuild_is_deterministic(store in arb_store()) {
        let a = GrainMap::build(store.clone()).unwrap();
        let b = GrainMap::build(store).unwrap();
        prop_assert_eq!(a, b);
    }
}
