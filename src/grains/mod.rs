//! Grain identity, per-grain averages and named field access.

pub mod access;
pub mod aggregate;
pub mod euler;
pub mod identity;
pub mod ids;

pub use access::{AvgDataFunctor, AvgField, PointDataFunctor, PointField};
pub use aggregate::{GrainMap, GrainSummary, PartialAggregate};
pub use euler::{EulerAngleProvider, EulerAngles};
pub use identity::{IdentitySpace, IdentitySpaceBuilder};
pub use ids::{FeatureId, GlobalId, LocalId, PhaseId};
