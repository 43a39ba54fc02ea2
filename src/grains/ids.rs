//! Tagged identifiers for the coexisting grain identifier spaces.
//!
//! Grains are indexed through several schemes:
//! - [`FeatureId`]: the grain number exactly as it appears in the measurement data,
//! - [`GlobalId`]: dense `0..G` index into the grain summaries,
//! - [`LocalId`]: `0..L_p` position inside the grain list of one phase; only unique
//!   together with a [`PhaseId`].
//!
//! Each space gets its own newtype so a value from one space can never be passed
//! where another is expected. Translation happens only through
//! [`IdentitySpace`](crate::grains::identity::IdentitySpace).

use std::fmt;

macro_rules! tagged_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Copy,
            Clone,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wraps a raw value.
            #[inline]
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[inline]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

tagged_id!(
    /// Grain number as stored in the source measurement data.
    FeatureId(u32)
);
tagged_id!(
    /// Dense 0-based grain index across all phases.
    GlobalId(usize)
);
tagged_id!(
    /// 0-based grain index within one phase.
    LocalId(usize)
);
tagged_id!(
    /// Material phase number, verbatim from the source data.
    PhaseId(u32)
);

impl GlobalId {
    /// Position of this grain in global-id indexed arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl LocalId {
    /// Position of this grain inside its phase list.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl PhaseId {
    /// Position of this phase in phase-indexed arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for FeatureId {
    type Out = <u32 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        <u32 as mpi::datatype::Equivalence>::equivalent_datatype()
    }
}

#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for PhaseId {
    type Out = <u32 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        <u32 as mpi::datatype::Equivalence>::equivalent_datatype()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(FeatureId, u32);
    assert_eq_size!(PhaseId, u32);
    assert_eq_size!(GlobalId, usize);
    assert_eq_size!(LocalId, usize);

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(FeatureId::new(17).to_string(), "17");
        assert_eq!(format!("{:?}", GlobalId::new(3)), "GlobalId(3)");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&PhaseId::new(2)).unwrap();
        assert_eq!(json, "2");
        let back: LocalId = serde_json::from_str("5").unwrap();
        assert_eq!(back, LocalId::new(5));
    }

    #[test]
    fn phase_index_widens() {
        assert_eq!(PhaseId::new(4).index(), 4usize);
    }
}
