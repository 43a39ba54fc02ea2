//! Named field accessors for point and average records.
//!
//! Consumers that only know a field by name (for example from an input file)
//! ask the factory for a functor once and then apply it to any number of
//! records. Name resolution and validation happen at construction, so applying
//! a functor never fails.
//!
//! Recognized names:
//! - point and average records: `phi1`, `phi`, `phi2`, `phase`, `feature_id`,
//!   `custom<N>` for `N < custom_columns`;
//! - average records only: `local_id`, `point_count`, `centroid_x`,
//!   `centroid_y`, `centroid_z`.

use std::str::FromStr;
use std::sync::Arc;

use crate::data::point_store::PointRecord;
use crate::grain_error::GrainMapError;
use crate::grains::aggregate::GrainSummary;

/// Reads one numeric field of a [`PointRecord`].
pub trait PointDataFunctor: Send + Sync {
    fn value(&self, record: &PointRecord) -> f64;
}

/// Reads one numeric field of a [`GrainSummary`].
pub trait AvgDataFunctor: Send + Sync {
    fn value(&self, summary: &GrainSummary) -> f64;
}

/// Fields shared by point and average records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointField {
    Phi1,
    Phi,
    Phi2,
    Phase,
    FeatureId,
    Custom(usize),
}

/// Fields of an average record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AvgField {
    Point(PointField),
    LocalId,
    PointCount,
    /// Centroid component along axis 0, 1 or 2.
    Centroid(usize),
}

impl FromStr for PointField {
    type Err = GrainMapError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let field = match name {
            "phi1" => PointField::Phi1,
            "phi" => PointField::Phi,
            "phi2" => PointField::Phi2,
            "phase" => PointField::Phase,
            "feature_id" => PointField::FeatureId,
            _ => name
                .strip_prefix("custom")
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse().ok())
                .map(PointField::Custom)
                .ok_or_else(|| GrainMapError::UnknownField(name.to_string()))?,
        };
        Ok(field)
    }
}

impl FromStr for AvgField {
    type Err = GrainMapError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let field = match name {
            "local_id" => AvgField::LocalId,
            "point_count" => AvgField::PointCount,
            "centroid_x" => AvgField::Centroid(0),
            "centroid_y" => AvgField::Centroid(1),
            "centroid_z" => AvgField::Centroid(2),
            _ => AvgField::Point(name.parse()?),
        };
        Ok(field)
    }
}

impl PointField {
    fn check(self, name: &str, custom_columns: usize) -> Result<Self, GrainMapError> {
        match self {
            PointField::Custom(i) if i >= custom_columns => {
                Err(GrainMapError::UnknownField(name.to_string()))
            }
            _ => Ok(self),
        }
    }

    #[inline]
    fn read(self, record: &PointRecord) -> f64 {
        match self {
            PointField::Phi1 => record.angles.phi1,
            PointField::Phi => record.angles.phi,
            PointField::Phi2 => record.angles.phi2,
            PointField::Phase => f64::from(record.phase.get()),
            PointField::FeatureId => f64::from(record.feature_id.get()),
            PointField::Custom(i) => record.custom[i],
        }
    }

    #[inline]
    fn read_avg(self, summary: &GrainSummary) -> f64 {
        match self {
            PointField::Phi1 => summary.angles.phi1,
            PointField::Phi => summary.angles.phi,
            PointField::Phi2 => summary.angles.phi2,
            PointField::Phase => f64::from(summary.phase.get()),
            PointField::FeatureId => f64::from(summary.feature_id.get()),
            PointField::Custom(i) => summary.custom[i],
        }
    }
}

impl PointDataFunctor for PointField {
    fn value(&self, record: &PointRecord) -> f64 {
        self.read(record)
    }
}

impl AvgDataFunctor for AvgField {
    fn value(&self, summary: &GrainSummary) -> f64 {
        match *self {
            AvgField::Point(field) => field.read_avg(summary),
            AvgField::LocalId => summary.local_id.get() as f64,
            AvgField::PointCount => summary.point_count as f64,
            AvgField::Centroid(axis) => summary.centroid[axis],
        }
    }
}

/// Functor for the point field `name`.
///
/// # Errors
/// `UnknownField` for unrecognized names and custom columns outside
/// `0..custom_columns`.
pub fn point_data_access_functor(
    name: &str,
    custom_columns: usize,
) -> Result<Arc<dyn PointDataFunctor>, GrainMapError> {
    let field = name.parse::<PointField>()?.check(name, custom_columns)?;
    Ok(Arc::new(field))
}

/// Functor for the average field `name`.
///
/// # Errors
/// As [`point_data_access_functor`].
pub fn avg_data_access_functor(
    name: &str,
    custom_columns: usize,
) -> Result<Arc<dyn AvgDataFunctor>, GrainMapError> {
    let field = match name.parse::<AvgField>()? {
        AvgField::Point(field) => AvgField::Point(field.check(name, custom_columns)?),
        other => other,
    };
    Ok(Arc::new(field))
}
