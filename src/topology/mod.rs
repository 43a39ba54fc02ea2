//! Identifiers of the consuming mesh.

pub mod point;

pub use point::PointId;
