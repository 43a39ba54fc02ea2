//! PointStore: one measurement record per grid cell.
//!
//! The store is filled exactly once, either from a complete vector of records in
//! offset order ([`PointStore::try_new`]) or cell by cell through a
//! [`PointStoreBuilder`] that places each record by its coordinates. After that
//! it is read-only and addressed by grid offset only; spatial lookups go through
//! the attached [`GridGeometry`].

use crate::geometry::grid::GridGeometry;
use crate::grain_error::GrainMapError;
use crate::grains::euler::EulerAngles;
use crate::grains::ids::{FeatureId, PhaseId};

/// Raw measurement at one grid cell.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointRecord {
    pub phase: PhaseId,
    pub feature_id: FeatureId,
    pub angles: EulerAngles,
    /// Additional scalar columns, one per custom column of the store.
    pub custom: Vec<f64>,
}

impl PointRecord {
    pub fn new(phase: u32, feature_id: u32, angles: EulerAngles) -> Self {
        Self {
            phase: PhaseId::new(phase),
            feature_id: FeatureId::new(feature_id),
            angles,
            custom: Vec::new(),
        }
    }

    /// Attach custom column values.
    pub fn with_custom(mut self, custom: Vec<f64>) -> Self {
        self.custom = custom;
        self
    }
}

/// Fixed-size, offset-addressed sequence of [`PointRecord`]s.
///
/// # Invariants
/// - `records.len() == geometry.len()`.
/// - Every record has exactly `custom_columns` custom values.
#[derive(Clone, Debug, PartialEq)]
pub struct PointStore {
    geometry: GridGeometry,
    custom_columns: usize,
    records: Vec<PointRecord>,
}

impl PointStore {
    /// Wrap a complete set of records given in offset order.
    ///
    /// # Errors
    /// `CellCountMismatch` if the record count differs from the grid cell count,
    /// `CustomColumnMismatch` for the first record with the wrong column count.
    pub fn try_new(
        geometry: GridGeometry,
        custom_columns: usize,
        records: Vec<PointRecord>,
    ) -> Result<Self, GrainMapError> {
        if records.len() != geometry.len() {
            return Err(GrainMapError::CellCountMismatch {
                expected: geometry.len(),
                found: records.len(),
            });
        }
        for (offset, record) in records.iter().enumerate() {
            check_custom(offset, record, custom_columns)?;
        }
        log::debug!(
            "point store loaded: {} cells, {} custom columns",
            records.len(),
            custom_columns
        );
        Ok(Self {
            geometry,
            custom_columns,
            records,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of custom scalar columns per record.
    #[inline]
    pub fn custom_columns(&self) -> usize {
        self.custom_columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `offset`.
    ///
    /// # Panics
    /// Panics if `offset >= len()`. Offsets produced by the grid geometry are
    /// always in range.
    #[inline]
    pub fn record(&self, offset: usize) -> &PointRecord {
        self.records.get(offset).unwrap_or_else(|| {
            panic!(
                "grid offset {offset} out of range (grid has {} cells)",
                self.records.len()
            )
        })
    }

    /// Record at `offset`, or `OffsetOutOfRange`.
    #[inline]
    pub fn try_record(&self, offset: usize) -> Result<&PointRecord, GrainMapError> {
        self.records
            .get(offset)
            .ok_or(GrainMapError::OffsetOutOfRange {
                offset,
                len: self.records.len(),
            })
    }

    /// Record of the grid cell containing `p` (clamped onto the grid).
    #[inline]
    pub fn at_point(&self, p: &[f64; 3]) -> &PointRecord {
        &self.records[self.geometry.index_from_point(p)]
    }

    /// `(offset, record)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PointRecord)> + '_ {
        self.records.iter().enumerate()
    }
}

fn check_custom(
    offset: usize,
    record: &PointRecord,
    custom_columns: usize,
) -> Result<(), GrainMapError> {
    if record.custom.len() != custom_columns {
        return Err(GrainMapError::CustomColumnMismatch {
            offset,
            expected: custom_columns,
            found: record.custom.len(),
        });
    }
    Ok(())
}

/// Incremental filler for a [`PointStore`].
///
/// Readers that stream records with their centroid coordinates insert them with
/// [`try_insert_at`](Self::try_insert_at); the builder refuses to produce a store
/// until every cell has exactly one record.
#[derive(Clone, Debug)]
pub struct PointStoreBuilder {
    geometry: GridGeometry,
    custom_columns: usize,
    slots: Vec<Option<PointRecord>>,
    filled: usize,
}

impl PointStoreBuilder {
    pub fn new(geometry: GridGeometry, custom_columns: usize) -> Self {
        let slots = vec![None; geometry.len()];
        Self {
            geometry,
            custom_columns,
            slots,
            filled: 0,
        }
    }

    /// Place `record` in the cell containing `p`; returns the cell offset.
    pub fn try_insert_at(
        &mut self,
        p: &[f64; 3],
        record: PointRecord,
    ) -> Result<usize, GrainMapError> {
        let offset = self.geometry.index_from_point(p);
        self.try_set(offset, record)?;
        Ok(offset)
    }

    /// Place `record` at a known offset.
    ///
    /// # Errors
    /// `OffsetOutOfRange`, `CustomColumnMismatch`, or `DuplicateCell` if the cell
    /// already holds a record.
    pub fn try_set(&mut self, offset: usize, record: PointRecord) -> Result<(), GrainMapError> {
        let len = self.slots.len();
        check_custom(offset, &record, self.custom_columns)?;
        let slot = self
            .slots
            .get_mut(offset)
            .ok_or(GrainMapError::OffsetOutOfRange { offset, len })?;
        if slot.is_some() {
            return Err(GrainMapError::DuplicateCell { offset });
        }
        *slot = Some(record);
        self.filled += 1;
        Ok(())
    }

    /// Number of cells filled so far.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Freeze into a [`PointStore`].
    ///
    /// # Errors
    /// `MissingCells` if any cell was never filled.
    pub fn finish(self) -> Result<PointStore, GrainMapError> {
        let expected = self.slots.len();
        if self.filled != expected {
            return Err(GrainMapError::MissingCells {
                missing: expected - self.filled,
                expected,
            });
        }
        let records = self.slots.into_iter().flatten().collect();
        PointStore::try_new(self.geometry, self.custom_columns, records)
    }
}
