#![allow(dead_code)]
use grain_map::{
    data::point_store::{PointRecord, PointStore},
    geometry::grid::GridGeometry,
    grains::euler::EulerAngles,
    topology::point::PointId,
};

pub fn pid(u: u64) -> PointId {
    PointId::new(u).unwrap()
}

/// Unit-spaced grid with its origin at 0.
pub fn unit_grid(dimension: usize, counts: [usize; 3]) -> GridGeometry {
    GridGeometry::try_new(dimension, [0.0; 3], [1.0; 3], counts).unwrap()
}

/// Record with only `phi1` set.
pub fn rec(phase: u32, feature: u32, phi1: f64) -> PointRecord {
    PointRecord::new(phase, feature, EulerAngles::new(phi1, 0.0, 0.0))
}

/// Store over a 1-D line, one record per cell.
pub fn line_store(records: Vec<PointRecord>) -> PointStore {
    let n = records.len();
    PointStore::try_new(unit_grid(1, [n, 1, 1]), 0, records).unwrap()
}

/// Store over an `nx` x `ny` grid from `(phase, feature)` pairs in offset order.
pub fn plane_store(nx: usize, ny: usize, cells: &[(u32, u32)]) -> PointStore {
    let records = cells
        .iter()
        .map(|&(phase, feature)| rec(phase, feature, feature as f64))
        .collect();
    PointStore::try_new(unit_grid(2, [nx, ny, 1]), 0, records).unwrap()
}
