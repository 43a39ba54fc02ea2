mod util;
use grain_map::algs::reduction::{merge_node_weight_maps, merge_partial_aggregates};
use grain_map::algs::weights::{Neighborhood, WeightMapOptions, build_node_weight_maps};
use grain_map::grain_error::GrainMapError;
use grain_map::grains::aggregate::{GrainMap, PartialAggregate};
use util::*;

fn cells() -> Vec<(u32, u32)> {
    vec![
        (1, 6), (1, 6), (2, 9), (1, 2),
        (2, 9), (2, 5), (1, 2), (1, 6),
        (2, 5), (2, 5), (1, 2), (2, 9),
    ]
}

#[test]
fn workers_split_by_offset_reproduce_the_single_pass() {
    let store = plane_store(4, 3, &cells());
    let parts = [0..5, 5..7, 7..12]
        .into_iter()
        .rev()
        .map(|range| PartialAggregate::from_store_range(&store, range).unwrap());
    let merged = merge_partial_aggregates(parts).unwrap().unwrap();
    assert_eq!(merged.points(), store.len());

    let from_workers = GrainMap::from_partial(store.clone(), merged).unwrap();
    let single = GrainMap::build(store).unwrap();
    assert_eq!(from_workers.identity(), single.identity());
    for (a, b) in from_workers.summaries().iter().zip(single.summaries()) {
        assert_eq!(a.feature_id, b.feature_id);
        assert_eq!(a.local_id, b.local_id);
        assert_eq!(a.point_count, b.point_count);
    }
}

#[test]
fn worker_weight_maps_union_to_the_full_map() {
    let map = GrainMap::build(plane_store(4, 3, &cells())).unwrap();
    let options = WeightMapOptions {
        neighborhood: Neighborhood::Radius(1.2),
        ..WeightMapOptions::default()
    };
    let all: Vec<_> = (1..=6)
        .map(|i| (pid(i), [0.6 * i as f64, 0.4 * i as f64, 0.0]))
        .collect();
    let (left, right) = all.split_at(2);

    let full = build_node_weight_maps(&map, &all, &options).unwrap();
    let merged = merge_node_weight_maps([
        build_node_weight_maps(&map, right, &options).unwrap(),
        build_node_weight_maps(&map, left, &options).unwrap(),
    ])
    .unwrap()
    .unwrap();
    assert_eq!(merged, full);
}

#[test]
fn overlapping_worker_ranges_fail_to_merge() {
    let store = line_store(vec![rec(0, 1, 10.0), rec(0, 1, 20.0), rec(0, 2, 0.0), rec(0, 3, 0.0)]);
    let parts = [0..2, 1..3]
        .into_iter()
        .map(|range| PartialAggregate::from_store_range(&store, range).unwrap());
    assert_eq!(
        merge_partial_aggregates(parts),
        Err(GrainMapError::OverlappingCoverage { offset: 1 })
    );
}

#[test]
fn partial_of_another_store_is_not_finalized() {
    let ours = line_store(vec![rec(0, 1, 0.0), rec(0, 2, 0.0)]);
    let theirs = line_store(vec![rec(0, 7, 0.0), rec(0, 8, 0.0)]);
    let partial = PartialAggregate::from_store(&theirs).unwrap();
    assert_eq!(
        GrainMap::from_partial(ours, partial),
        Err(GrainMapError::ForeignPartial { offset: 0 })
    );
}

#[test]
fn every_cell_of_a_merged_map_is_weighed() {
    let store = plane_store(4, 3, &cells());
    let parts = [0..6, 6..12]
        .into_iter()
        .map(|range| PartialAggregate::from_store_range(&store, range).unwrap());
    let merged = merge_partial_aggregates(parts).unwrap().unwrap();
    let map = GrainMap::from_partial(store, merged).unwrap();
    let centroids: Vec<_> = (0..map.point_store().len())
        .map(|offset| (pid(offset as u64 + 1), map.geometry().centroid(offset).unwrap()))
        .collect();
    let w = build_node_weight_maps(&map, &centroids, &WeightMapOptions::default()).unwrap();
    assert_eq!(w.len(), centroids.len());
    for (offset, (node, _)) in centroids.iter().enumerate() {
        let g = map.global_id_of_cell(offset).unwrap();
        assert_eq!(w.grain_weights_of(*node).unwrap()[g.index()], 1.0);
    }
}
