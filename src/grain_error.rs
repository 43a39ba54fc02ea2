//! GrainMapError: Unified error type for grain-map public APIs
//!
//! Every fallible operation in the crate returns this error. Variants name the
//! invariant that failed together with the offending ids so callers can report
//! a precise diagnostic.

use thiserror::Error;

use crate::grains::ids::{FeatureId, GlobalId, LocalId, PhaseId};
use crate::topology::point::PointId;

/// Unified error type for grain-map operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrainMapError {
    /// Attempted to construct a PointId with a zero value (invalid).
    #[error("PointId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidPointId,
    /// Grid parameters are unusable (bad dimension, spacing, origin or counts).
    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),
    /// The number of records does not match `nx * ny * nz`.
    #[error("Grid declares {expected} cells but {found} records were supplied")]
    CellCountMismatch { expected: usize, found: usize },
    /// Some grid cells never received a record.
    #[error("{missing} of {expected} grid cells have no record")]
    MissingCells { missing: usize, expected: usize },
    /// Two records were placed into the same grid cell.
    #[error("Grid cell {offset} was filled twice")]
    DuplicateCell { offset: usize },
    /// A linear grid offset outside `[0, len)`.
    #[error("Grid offset {offset} out of range (grid has {len} cells)")]
    OffsetOutOfRange { offset: usize, len: usize },
    /// A record carries the wrong number of custom columns.
    #[error("Record at offset {offset} has {found} custom columns, expected {expected}")]
    CustomColumnMismatch {
        offset: usize,
        expected: usize,
        found: usize,
    },
    /// The same feature id was observed with two different phases.
    #[error("Feature {feature} belongs to phase {first} but was also observed in phase {found}")]
    ConflictingPhase {
        feature: FeatureId,
        first: PhaseId,
        found: PhaseId,
    },
    /// A feature id that was never observed in the point data.
    #[error("Unknown feature id {0}")]
    UnknownFeature(FeatureId),
    /// A global grain id `>= grain_num`.
    #[error("Global id {id} out of range ({grain_num} grains)")]
    GlobalIdOutOfRange { id: GlobalId, grain_num: usize },
    /// A phase number `>= phase_num`.
    #[error("Phase {phase} out of range ({phase_num} phases)")]
    PhaseOutOfRange { phase: PhaseId, phase_num: usize },
    /// A local id `>= grain_num(phase)`.
    #[error("Local id {local_id} out of range for phase {phase} ({grain_num} grains)")]
    LocalIdOutOfRange {
        phase: PhaseId,
        local_id: LocalId,
        grain_num: usize,
    },
    /// An access functor was requested for a field that does not exist.
    #[error("Unknown field `{0}`")]
    UnknownField(String),
    /// Weight-map options are not usable.
    #[error("Invalid weight map options: {0}")]
    InvalidWeightOptions(String),
    /// A point was registered twice.
    #[error("Duplicate point {0}")]
    DuplicatePoint(PointId),
    /// A point was looked up but never registered.
    #[error("Point {0} not found")]
    PointNotFound(PointId),
    /// Coordinate slice length does not match the table dimension.
    #[error("Coordinate dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A (merged) partial aggregate does not cover the point store.
    #[error("Partial aggregate covers {found} points but the store holds {expected}")]
    IncompletePartial { expected: usize, found: usize },
    /// A grid cell was accumulated twice, by one partial or by two merged partials.
    #[error("Grid cell {offset} is covered by more than one partial aggregate")]
    OverlappingCoverage { offset: usize },
    /// A partial aggregate leaves a grid cell of the store uncovered.
    #[error("Partial aggregate does not cover grid cell {offset} (grid has {len} cells)")]
    UncoveredCell { offset: usize, len: usize },
    /// A partial aggregate was accumulated from other data than the store.
    #[error("Partial aggregate disagrees with the point store at grid cell {offset}")]
    ForeignPartial { offset: usize },
    /// Two partial aggregates, or a partial and its store, disagree on the
    /// number of custom columns.
    #[error("Custom column count mismatch: expected {expected}, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
    /// A phase number beyond what the identity tables accept.
    #[error("Phase {phase} exceeds the supported maximum of {limit} phases")]
    PhaseLimitExceeded { phase: PhaseId, limit: usize },
    /// Weight maps built against different grain or phase counts cannot be merged.
    #[error(
        "Weight map shape mismatch: {grains_a}x{phases_a} grains/phases vs {grains_b}x{phases_b}"
    )]
    WeightMapShapeMismatch {
        grains_a: usize,
        phases_a: usize,
        grains_b: usize,
        phases_b: usize,
    },
}
