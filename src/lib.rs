#![cfg_attr(docsrs, feature(doc_cfg))]
//! # grain-map
//!
//! grain-map indexes gridded crystallographic measurements (EBSD-style data) by
//! grain and phase, computes per-grain averages, and maps arbitrary mesh nodes to
//! weighted grain and phase contributions, e.g. to initialize order parameters of
//! a phase-field simulation from measured microstructure.
//!
//! ## Pipeline
//! 1. A file reader fills a [`PointStore`](data::PointStore) (one
//!    [`PointRecord`](data::PointRecord) per grid cell), directly or through a
//!    [`PointStoreBuilder`](data::PointStoreBuilder).
//! 2. [`GrainMap::build`](grains::GrainMap::build) runs one pass over the store and
//!    freezes the identifier tables and grain averages.
//! 3. [`build_node_weight_maps`](algs::build_node_weight_maps) weighs mesh nodes
//!    given through the [`NodePositions`](data::NodePositions) trait.
//!
//! ## Identifier spaces
//! Grains are addressed by [`FeatureId`](grains::FeatureId) (as in the data),
//! [`GlobalId`](grains::GlobalId) (dense index) and
//! [`PhaseId`](grains::PhaseId)/[`LocalId`](grains::LocalId) pairs. Translation
//! goes through [`IdentitySpace`](grains::IdentitySpace) only.
//!
//! ## Determinism
//! Global and local ids follow the first-seen order of a pass over the store in
//! offset order, so the same input always yields the same ids. Partial
//! aggregates computed by separate workers merge back into the same assignment
//! (see [`algs::reduction`]).
//!
//! ## Features
//! - `rayon`: evaluate node weights in parallel.
//! - `mpi-support`: MPI datatype equivalence for [`PointId`](topology::PointId),
//!   [`FeatureId`](grains::FeatureId) and [`PhaseId`](grains::PhaseId).

pub mod algs;
pub mod data;
pub mod geometry;
pub mod grain_error;
pub mod grains;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::reduction::{merge_node_weight_maps, merge_partial_aggregates};
    pub use crate::algs::weights::{
        Kernel, Neighborhood, NodeWeightMaps, WeightMapOptions, build_node_weight_maps,
    };
    pub use crate::data::coordinates::{NodeCoordinates, NodePositions};
    pub use crate::data::point_store::{PointRecord, PointStore, PointStoreBuilder};
    pub use crate::geometry::grid::GridGeometry;
    pub use crate::grain_error::GrainMapError;
    pub use crate::grains::access::{AvgDataFunctor, PointDataFunctor};
    pub use crate::grains::aggregate::{GrainMap, GrainSummary, PartialAggregate};
    pub use crate::grains::euler::{EulerAngleProvider, EulerAngles};
    pub use crate::grains::identity::IdentitySpace;
    pub use crate::grains::ids::{FeatureId, GlobalId, LocalId, PhaseId};
    pub use crate::topology::point::PointId;
}
