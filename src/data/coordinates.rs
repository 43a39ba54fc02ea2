//! Node positions of the consuming mesh.
//!
//! The weight-map builder only needs read access to node coordinates, so the
//! mesh is seen through the [`NodePositions`] trait. [`NodeCoordinates`] is a
//! small fixed-dimension coordinate table for callers that do not already
//! have a mesh type implementing it.

use hashbrown::HashMap;

use crate::grain_error::GrainMapError;
use crate::topology::point::PointId;

/// Read-only source of mesh node positions.
pub trait NodePositions {
    /// Every node with its coordinates; axes beyond the mesh dimension are 0.
    fn node_positions(&self) -> impl Iterator<Item = (PointId, [f64; 3])> + '_;
}

impl NodePositions for [(PointId, [f64; 3])] {
    fn node_positions(&self) -> impl Iterator<Item = (PointId, [f64; 3])> + '_ {
        self.iter().copied()
    }
}

impl NodePositions for Vec<(PointId, [f64; 3])> {
    fn node_positions(&self) -> impl Iterator<Item = (PointId, [f64; 3])> + '_ {
        self.iter().copied()
    }
}

/// Coordinate storage with an attached dimension.
///
/// # Invariants
/// - Each point appears exactly once in `order`.
/// - `values.len() == order.len() * dimension`.
/// - Iteration follows insertion order.
#[derive(Clone, Debug)]
pub struct NodeCoordinates {
    dimension: usize,
    order: Vec<PointId>,
    index: HashMap<PointId, usize>,
    values: Vec<f64>,
}

impl NodeCoordinates {
    /// Construct an empty coordinate table with a fixed dimension.
    pub fn try_new(dimension: usize) -> Result<Self, GrainMapError> {
        if !(1..=3).contains(&dimension) {
            return Err(GrainMapError::InvalidGeometry(format!(
                "node dimension must be 1, 2 or 3, got {dimension}"
            )));
        }
        Ok(Self {
            dimension,
            order: Vec::new(),
            index: HashMap::new(),
            values: Vec::new(),
        })
    }

    /// Returns the spatial dimension per point.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds a point with its coordinates.
    ///
    /// # Errors
    /// `DimensionMismatch` if `coords.len() != dimension`, `DuplicatePoint` if `p`
    /// is already present.
    pub fn try_add_point(&mut self, p: PointId, coords: &[f64]) -> Result<(), GrainMapError> {
        if coords.len() != self.dimension {
            return Err(GrainMapError::DimensionMismatch {
                expected: self.dimension,
                found: coords.len(),
            });
        }
        if self.index.contains_key(&p) {
            return Err(GrainMapError::DuplicatePoint(p));
        }
        self.index.insert(p, self.order.len());
        self.order.push(p);
        self.values.extend_from_slice(coords);
        Ok(())
    }

    /// Read-only view of the coordinate slice for a point `p`.
    pub fn try_restrict(&self, p: PointId) -> Result<&[f64], GrainMapError> {
        let slot = *self.index.get(&p).ok_or(GrainMapError::PointNotFound(p))?;
        let start = slot * self.dimension;
        Ok(&self.values[start..start + self.dimension])
    }

    /// Iterator over `(PointId, &[f64])` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &[f64])> + '_ {
        self.order
            .iter()
            .copied()
            .zip(self.values.chunks_exact(self.dimension))
    }
}

impl NodePositions for NodeCoordinates {
    fn node_positions(&self) -> impl Iterator<Item = (PointId, [f64; 3])> + '_ {
        self.iter().map(|(p, coords)| {
            let mut padded = [0.0; 3];
            padded[..coords.len()].copy_from_slice(coords);
            (p, padded)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: u64) -> PointId {
        PointId::new(raw).unwrap()
    }

    #[test]
    fn add_and_restrict() {
        let mut coords = NodeCoordinates::try_new(2).unwrap();
        coords.try_add_point(pid(3), &[1.0, 2.0]).unwrap();
        coords.try_add_point(pid(1), &[0.5, -1.0]).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.try_restrict(pid(1)).unwrap(), &[0.5, -1.0]);
        assert_eq!(
            coords.try_restrict(pid(9)),
            Err(GrainMapError::PointNotFound(pid(9)))
        );
    }

    #[test]
    fn rejects_wrong_dimension_and_duplicates() {
        let mut coords = NodeCoordinates::try_new(3).unwrap();
        assert_eq!(
            coords.try_add_point(pid(1), &[1.0, 2.0]),
            Err(GrainMapError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        );
        coords.try_add_point(pid(1), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            coords.try_add_point(pid(1), &[0.0; 3]),
            Err(GrainMapError::DuplicatePoint(pid(1)))
        );
        assert!(NodeCoordinates::try_new(0).is_err());
    }

    #[test]
    fn positions_are_padded_in_insertion_order() {
        let mut coords = NodeCoordinates::try_new(1).unwrap();
        coords.try_add_point(pid(5), &[4.0]).unwrap();
        coords.try_add_point(pid(2), &[1.0]).unwrap();
        let got: Vec<_> = coords.node_positions().collect();
        assert_eq!(got, vec![(pid(5), [4.0, 0.0, 0.0]), (pid(2), [1.0, 0.0, 0.0])]);
    }
}
