//! Data module: measurement records and mesh node positions

pub mod coordinates;
pub mod point_store;

pub use coordinates::{NodeCoordinates, NodePositions};
pub use point_store::{PointRecord, PointStore, PointStoreBuilder};
