//! Re-export public algorithms.

pub mod reduction;
pub mod weights;

pub use reduction::{merge_node_weight_maps, merge_partial_aggregates};
pub use weights::{Kernel, Neighborhood, NodeWeightMaps, WeightMapOptions, build_node_weight_maps};
