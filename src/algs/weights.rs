//! Node-to-grain and node-to-phase weight maps.
//!
//! For every mesh node the builder collects the grid cells in the node's
//! neighborhood, weighs each by a kernel of its centroid distance, sums the
//! weights per grain and normalizes them to 1. Phase weights are the grain
//! weights summed per phase. Nodes whose neighborhood holds no cell get no
//! entry.
//!
//! Kernels are evaluated relative to the nearest contributing cell, which
//! always weighs 1. The factor cancels in the normalization, and a node far
//! from every centroid keeps its entry instead of underflowing to zero.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use itertools::iproduct;

use crate::data::coordinates::NodePositions;
use crate::grain_error::GrainMapError;
use crate::grains::aggregate::GrainMap;
use crate::grains::ids::GlobalId;
use crate::topology::point::PointId;

/// Which grid cells influence a node.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// Only the (clamped) cell containing the node.
    ContainingCell,
    /// Every cell whose centroid lies within this distance of the node.
    Radius(f64),
}

/// Weight of a cell as a function of its centroid distance `d`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// Every cell weighs 1.
    Uniform,
    /// `exp(-d^2 / (2 sigma^2))`.
    Gaussian { sigma: f64 },
    /// `1 / (d + epsilon)`.
    InverseDistance { epsilon: f64 },
}

impl Kernel {
    /// Kernel value at distance `d` divided by its value at `nearest <= d`.
    #[inline]
    fn relative_weight(self, d: f64, nearest: f64) -> f64 {
        if d <= nearest {
            return 1.0;
        }
        match self {
            Kernel::Uniform => 1.0,
            Kernel::Gaussian { sigma } => {
                (-((d - nearest) * (d + nearest)) / (2.0 * sigma * sigma)).exp()
            }
            Kernel::InverseDistance { epsilon } => (nearest + epsilon) / (d + epsilon),
        }
    }
}

/// Options for [`build_node_weight_maps`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WeightMapOptions {
    pub neighborhood: Neighborhood,
    pub kernel: Kernel,
}

impl Default for WeightMapOptions {
    fn default() -> Self {
        Self {
            neighborhood: Neighborhood::ContainingCell,
            kernel: Kernel::Uniform,
        }
    }
}

impl WeightMapOptions {
    /// Checks that radius and kernel parameters are positive and finite.
    pub fn validate(&self) -> Result<(), GrainMapError> {
        let positive = |what: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(GrainMapError::InvalidWeightOptions(format!(
                    "{what} must be positive and finite, got {v}"
                )))
            }
        };
        if let Neighborhood::Radius(r) = self.neighborhood {
            positive("radius", r)?;
        }
        match self.kernel {
            Kernel::Uniform => Ok(()),
            Kernel::Gaussian { sigma } => positive("sigma", sigma),
            Kernel::InverseDistance { epsilon } => positive("epsilon", epsilon),
        }
    }
}

/// Per-node grain and phase weight vectors.
///
/// Grain vectors have length `grain_num`, phase vectors length `phase_num`;
/// entries are non-negative and each vector sums to 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeWeightMaps {
    grain_num: usize,
    phase_num: usize,
    grain: BTreeMap<PointId, Vec<f64>>,
    phase: BTreeMap<PointId, Vec<f64>>,
}

impl NodeWeightMaps {
    pub(crate) fn empty(grain_num: usize, phase_num: usize) -> Self {
        Self {
            grain_num,
            phase_num,
            ..Self::default()
        }
    }

    pub(crate) fn insert(
        &mut self,
        node: PointId,
        grain: Vec<f64>,
        phase: Vec<f64>,
    ) -> Result<(), GrainMapError> {
        debug_assert_eq!(grain.len(), self.grain_num);
        debug_assert_eq!(phase.len(), self.phase_num);
        if self.grain.contains_key(&node) {
            return Err(GrainMapError::DuplicatePoint(node));
        }
        self.grain.insert(node, grain);
        self.phase.insert(node, phase);
        Ok(())
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (PointId, Vec<f64>, Vec<f64>)> {
        self.grain
            .into_iter()
            .zip(self.phase.into_values())
            .map(|((node, grain), phase)| (node, grain, phase))
    }

    /// Grain weights keyed by node.
    #[inline]
    pub fn grain_weights(&self) -> &BTreeMap<PointId, Vec<f64>> {
        &self.grain
    }

    /// Phase weights keyed by node.
    #[inline]
    pub fn phase_weights(&self) -> &BTreeMap<PointId, Vec<f64>> {
        &self.phase
    }

    pub fn grain_weights_of(&self, node: PointId) -> Option<&[f64]> {
        self.grain.get(&node).map(Vec::as_slice)
    }

    pub fn phase_weights_of(&self, node: PointId) -> Option<&[f64]> {
        self.phase.get(&node).map(Vec::as_slice)
    }

    #[inline]
    pub fn grain_num(&self) -> usize {
        self.grain_num
    }

    #[inline]
    pub fn phase_num(&self) -> usize {
        self.phase_num
    }

    /// Number of nodes with an entry.
    #[inline]
    pub fn len(&self) -> usize {
        self.grain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grain.is_empty()
    }
}

/// Build the weight maps of `nodes` against `grains`.
///
/// # Errors
/// `InvalidWeightOptions` if `options` fail validation, `DuplicatePoint` if
/// `nodes` lists a node twice.
pub fn build_node_weight_maps<P>(
    grains: &GrainMap,
    nodes: &P,
    options: &WeightMapOptions,
) -> Result<NodeWeightMaps, GrainMapError>
where
    P: NodePositions + ?Sized,
{
    options.validate()?;
    let positions: Vec<(PointId, [f64; 3])> = nodes.node_positions().collect();
    let mut seen = HashSet::with_capacity(positions.len());
    if let Some(&(node, _)) = positions.iter().find(|(node, _)| !seen.insert(*node)) {
        return Err(GrainMapError::DuplicatePoint(node));
    }
    let mut maps = NodeWeightMaps::empty(grains.grain_num(), grains.phase_num());

    #[cfg(feature = "rayon")]
    let weighed: Vec<(PointId, Option<(Vec<f64>, Vec<f64>)>)> = {
        use rayon::prelude::*;
        positions
            .into_par_iter()
            .map(|(node, p)| (node, node_weights(grains, &p, options)))
            .collect()
    };
    #[cfg(not(feature = "rayon"))]
    let weighed = positions
        .into_iter()
        .map(|(node, p)| (node, node_weights(grains, &p, options)));

    let mut skipped = 0usize;
    for (node, weights) in weighed {
        match weights {
            Some((grain, phase)) => maps.insert(node, grain, phase)?,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("{skipped} nodes have no grid cell in their neighborhood and were left out of the weight maps");
    }
    log::debug!(
        "node weight maps built: {} nodes, {} grains, {} phases",
        maps.len(),
        maps.grain_num(),
        maps.phase_num()
    );
    Ok(maps)
}

/// Normalized grain and phase weights of a single node, or `None` when no
/// cell lies in its neighborhood.
fn node_weights(
    grains: &GrainMap,
    p: &[f64; 3],
    options: &WeightMapOptions,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let geometry = grains.geometry();
    let mut grain = vec![0.0; grains.grain_num()];

    match options.neighborhood {
        Neighborhood::ContainingCell => {
            // the clamped cell is the only contributor, whatever the kernel
            let offset = geometry.index_from_point(p);
            grain[grains.cell_grain(offset).index()] = 1.0;
        }
        Neighborhood::Radius(radius) => {
            let (lo, hi) = geometry.cell_bounds_around(p, radius)?;
            let contributors: Vec<(GlobalId, f64)> =
                iproduct!(lo[2]..=hi[2], lo[1]..=hi[1], lo[0]..=hi[0])
                    .filter_map(|(iz, iy, ix)| {
                        let cell = [ix, iy, iz];
                        let d = geometry.distance(p, &geometry.centroid_of_cell(cell));
                        (d <= radius).then(|| (grains.cell_grain(geometry.offset(cell)), d))
                    })
                    .collect();
            let nearest = contributors
                .iter()
                .map(|&(_, d)| d)
                .min_by(f64::total_cmp)?;
            for (global, d) in contributors {
                grain[global.index()] += options.kernel.relative_weight(d, nearest);
            }
            let total: f64 = grain.iter().sum();
            debug_assert!(total >= 1.0 && total.is_finite());
            grain.iter_mut().for_each(|w| *w /= total);
        }
    }

    let mut phase = vec![0.0; grains.phase_num()];
    for (g, w) in grain.iter().enumerate() {
        let summary = &grains.summaries()[g];
        phase[summary.phase.index()] += w;
    }
    Some((grain, phase))
}
