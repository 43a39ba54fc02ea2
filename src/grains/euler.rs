//! Euler angle triplets and the provider interface used by orientation consumers.

use crate::grain_error::GrainMapError;
use crate::grains::ids::GlobalId;

/// Orientation as three Euler angles `(phi1, Phi, phi2)`.
///
/// Angles are stored in whatever unit and convention the measurement data uses;
/// nothing in this crate converts or wraps them.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EulerAngles {
    pub phi1: f64,
    pub phi: f64,
    pub phi2: f64,
}

impl EulerAngles {
    pub const fn new(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self { phi1, phi, phi2 }
    }

    #[inline]
    pub(crate) fn to_array(self) -> [f64; 3] {
        [self.phi1, self.phi, self.phi2]
    }

    #[inline]
    pub(crate) fn from_array([phi1, phi, phi2]: [f64; 3]) -> Self {
        Self { phi1, phi, phi2 }
    }
}

/// Anything that can hand out one orientation per grain.
pub trait EulerAngleProvider {
    /// Average orientation of the grain with global id `grain`.
    fn euler_angles(&self, grain: GlobalId) -> Result<&EulerAngles, GrainMapError>;

    /// Number of grains the provider knows about.
    fn grain_num(&self) -> usize;
}
