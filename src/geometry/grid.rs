//! Structured measurement grid: coordinate to cell-offset mapping.
//!
//! Measurement points sit at the centroids of a regular grid with up to three
//! axes. Axes beyond the grid dimension are collapsed: their count is 1 and
//! their cell index is always 0. Cells are stored row-major with `x` fastest:
//! `offset = ix + nx * (iy + ny * iz)`.

use crate::grain_error::GrainMapError;

/// Geometry parameters of a regularly spaced measurement grid.
///
/// # Invariants
/// - `1 <= dimension <= 3`.
/// - Active axes have a finite, strictly positive spacing and a non-zero count.
/// - Inactive axes have count 1.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridGeometry {
    dimension: usize,
    origin: [f64; 3],
    spacing: [f64; 3],
    counts: [usize; 3],
}

impl GridGeometry {
    /// Builds and validates grid geometry.
    ///
    /// # Errors
    /// [`GrainMapError::InvalidGeometry`] when any invariant above is violated
    /// or when the total cell count overflows `usize`.
    pub fn try_new(
        dimension: usize,
        origin: [f64; 3],
        spacing: [f64; 3],
        counts: [usize; 3],
    ) -> Result<Self, GrainMapError> {
        if !(1..=3).contains(&dimension) {
            return Err(GrainMapError::InvalidGeometry(format!(
                "dimension must be 1, 2 or 3, got {dimension}"
            )));
        }
        for axis in 0..3 {
            if axis < dimension {
                if !origin[axis].is_finite() {
                    return Err(GrainMapError::InvalidGeometry(format!(
                        "origin on axis {axis} is not finite"
                    )));
                }
                if !(spacing[axis].is_finite() && spacing[axis] > 0.0) {
                    return Err(GrainMapError::InvalidGeometry(format!(
                        "spacing on axis {axis} must be positive, got {}",
                        spacing[axis]
                    )));
                }
                if counts[axis] == 0 {
                    return Err(GrainMapError::InvalidGeometry(format!(
                        "axis {axis} has no cells"
                    )));
                }
            } else if counts[axis] != 1 {
                return Err(GrainMapError::InvalidGeometry(format!(
                    "unused axis {axis} must have exactly one cell, got {}",
                    counts[axis]
                )));
            }
        }
        counts
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| GrainMapError::InvalidGeometry("cell count overflows usize".into()))?;
        Ok(Self {
            dimension,
            origin,
            spacing,
            counts,
        })
    }

    /// Spatial dimension of the grid.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Grid origin; equal to [`bottom_left`](Self::bottom_left).
    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Cells per axis `[nx, ny, nz]`.
    #[inline]
    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    /// Total number of cells, `nx * ny * nz`.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts[0] * self.counts[1] * self.counts[2]
    }

    /// A validated grid always has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Lower corner of the domain bounding box.
    pub fn bottom_left(&self) -> [f64; 3] {
        let mut corner = [0.0; 3];
        for axis in 0..self.dimension {
            corner[axis] = self.origin[axis];
        }
        corner
    }

    /// Upper corner of the domain bounding box.
    pub fn top_right(&self) -> [f64; 3] {
        let mut corner = [0.0; 3];
        for axis in 0..self.dimension {
            corner[axis] = self.origin[axis] + self.spacing[axis] * self.counts[axis] as f64;
        }
        corner
    }

    /// Extent of the bounding box, `top_right - bottom_left`.
    pub fn range(&self) -> [f64; 3] {
        let (lo, hi) = (self.bottom_left(), self.top_right());
        [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]]
    }

    /// Whether `p` lies inside the bounding box (boundaries inclusive, active axes only).
    pub fn contains(&self, p: &[f64; 3]) -> bool {
        let (lo, hi) = (self.bottom_left(), self.top_right());
        (0..self.dimension).all(|axis| p[axis] >= lo[axis] && p[axis] <= hi[axis])
    }

    /// Cell index along one axis, clamped to `[0, n - 1]`.
    #[inline]
    fn axis_index(&self, axis: usize, x: f64) -> usize {
        if axis >= self.dimension {
            return 0;
        }
        let raw = ((x - self.origin[axis]) / self.spacing[axis]).floor();
        let max = (self.counts[axis] - 1) as f64;
        // NaN fails both comparisons and lands on 0 through the saturating cast.
        raw.clamp(0.0, max) as usize
    }

    /// Grid cell containing `p`, clamped onto the grid.
    ///
    /// Points outside the bounding box map to the nearest boundary cell;
    /// callers needing a strict check use [`contains`](Self::contains).
    pub fn cell_from_point(&self, p: &[f64; 3]) -> [usize; 3] {
        [
            self.axis_index(0, p[0]),
            self.axis_index(1, p[1]),
            self.axis_index(2, p[2]),
        ]
    }

    /// Linear offset of the cell containing `p`.
    ///
    /// # Example
    /// ```rust
    /// # use grain_map::geometry::grid::GridGeometry;
    /// let grid = GridGeometry::try_new(2, [0.0; 3], [1.0, 1.0, 1.0], [4, 3, 1]).unwrap();
    /// assert_eq!(grid.index_from_point(&[2.5, 1.5, 0.0]), 2 + 4 * 1);
    /// // clamped, not rejected
    /// assert_eq!(grid.index_from_point(&[-7.0, 99.0, 0.0]), 4 * 2);
    /// ```
    #[inline]
    pub fn index_from_point(&self, p: &[f64; 3]) -> usize {
        self.offset(self.cell_from_point(p))
    }

    /// Linear offset of a cell given per-axis indices.
    ///
    /// Indices must be in range; use [`cell_from_point`](Self::cell_from_point)
    /// to obtain them from coordinates.
    #[inline]
    pub fn offset(&self, cell: [usize; 3]) -> usize {
        debug_assert!((0..3).all(|a| cell[a] < self.counts[a]), "cell {cell:?} outside grid");
        cell[0] + self.counts[0] * (cell[1] + self.counts[1] * cell[2])
    }

    /// Per-axis indices of a linear offset.
    ///
    /// # Errors
    /// [`GrainMapError::OffsetOutOfRange`] when `offset >= len()`.
    pub fn cell(&self, offset: usize) -> Result<[usize; 3], GrainMapError> {
        if offset >= self.len() {
            return Err(GrainMapError::OffsetOutOfRange {
                offset,
                len: self.len(),
            });
        }
        let [nx, ny, _] = self.counts;
        Ok([offset % nx, (offset / nx) % ny, offset / (nx * ny)])
    }

    /// Centroid of the cell at `offset`; inactive axes are 0.
    pub fn centroid(&self, offset: usize) -> Result<[f64; 3], GrainMapError> {
        let cell = self.cell(offset)?;
        Ok(self.centroid_of_cell(cell))
    }

    pub(crate) fn centroid_of_cell(&self, cell: [usize; 3]) -> [f64; 3] {
        let mut c = [0.0; 3];
        for axis in 0..self.dimension {
            c[axis] = self.origin[axis] + (cell[axis] as f64 + 0.5) * self.spacing[axis];
        }
        c
    }

    /// Inclusive per-axis index bounds of all cells that may have a centroid
    /// within `radius` of `p`.
    ///
    /// Returns `None` when the axis-aligned box around `p` misses the grid on
    /// some active axis.
    pub(crate) fn cell_bounds_around(
        &self,
        p: &[f64; 3],
        radius: f64,
    ) -> Option<([usize; 3], [usize; 3])> {
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for axis in 0..self.dimension {
            let first_centroid = self.origin[axis] + 0.5 * self.spacing[axis];
            let from = ((p[axis] - radius - first_centroid) / self.spacing[axis]).ceil();
            let to = ((p[axis] + radius - first_centroid) / self.spacing[axis]).floor();
            let max = (self.counts[axis] - 1) as f64;
            if to < 0.0 || from > max || from.is_nan() || to.is_nan() {
                return None;
            }
            lo[axis] = from.max(0.0) as usize;
            hi[axis] = to.min(max) as usize;
        }
        Some((lo, hi))
    }

    /// Euclidean distance over the active axes.
    #[inline]
    pub(crate) fn distance(&self, a: &[f64; 3], b: &[f64; 3]) -> f64 {
        (0..self.dimension)
            .map(|axis| (a[axis] - b[axis]) * (a[axis] - b[axis]))
            .sum::<f64>()
            .sqrt()
    }
}
