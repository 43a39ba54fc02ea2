//! Geometry of the structured measurement grid.
//!
//! [`GridGeometry`] maps coordinates to cell offsets and back to centroids.

pub mod grid;

pub use grid::GridGeometry;
