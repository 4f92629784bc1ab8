use glam::{DVec2, DVec3, DVec4};
use std::fmt::Debug;
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

/// Largest ambient dimension a [`Vector`] implementation may have.
///
/// The simplex of a GJK instance holds at most `MAX_DIMENSION + 1` vertices, so every fixed-size
/// scratch buffer in the collision detection code is sized from this.
pub const MAX_DIMENSION: usize = 4;

/// Point/direction type of a fixed ambient dimension.
///
/// Implemented for `glam`'s double precision vectors. The GJK core and all primitives are generic over it,
/// so a single implementation covers 2D, 3D and (for space-time queries) 4D.
pub trait Vector:
    Copy
    + Default
    + PartialEq
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + Index<usize, Output = f64>
    + IndexMut<usize>
{
    /// Ambient dimension.
    const DIM: usize;
    /// The origin.
    const ZERO: Self;

    fn dot(self, rhs: Self) -> f64;

    #[inline(always)]
    fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Component-wise minimum.
    fn component_min(self, rhs: Self) -> Self;

    /// Component-wise maximum.
    fn component_max(self, rhs: Self) -> Self;

    fn abs(self) -> Self;

    fn splat(value: f64) -> Self;

    /// Reads the first `DIM` entries of `slice`.
    fn from_slice(slice: &[f64]) -> Self;

    /// Writes the vector into the first `DIM` entries of `slice`.
    fn write_to_slice(self, slice: &mut [f64]);

    /// Unit vector along `axis`.
    #[inline(always)]
    fn unit(axis: usize) -> Self {
        let mut e = Self::ZERO;
        e[axis] = 1.0;
        e
    }
}

/// A spatial vector that can be lifted into space-time by appending a time coordinate.
///
/// Moving primitives of dimension `DIM` are tested as static primitives of dimension `DIM + 1`.
pub trait LiftVector: Vector {
    type Lifted: Vector;

    /// Appends `time` as the last coordinate.
    fn extend(self, time: f64) -> Self::Lifted;

    /// Drops the time coordinate.
    fn truncate(lifted: Self::Lifted) -> Self;
}

macro_rules! impl_vector {
    ($t:ty, $dim:expr) => {
        impl Vector for $t {
            const DIM: usize = $dim;
            const ZERO: Self = <$t>::ZERO;

            #[inline(always)]
            fn dot(self, rhs: Self) -> f64 {
                <$t>::dot(self, rhs)
            }

            #[inline(always)]
            fn component_min(self, rhs: Self) -> Self {
                <$t>::min(self, rhs)
            }

            #[inline(always)]
            fn component_max(self, rhs: Self) -> Self {
                <$t>::max(self, rhs)
            }

            #[inline(always)]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline(always)]
            fn splat(value: f64) -> Self {
                <$t>::splat(value)
            }

            #[inline(always)]
            fn from_slice(slice: &[f64]) -> Self {
                <$t>::from_slice(slice)
            }

            #[inline(always)]
            fn write_to_slice(self, slice: &mut [f64]) {
                <$t>::write_to_slice(self, slice)
            }
        }
    };
}

impl_vector!(DVec2, 2);
impl_vector!(DVec3, 3);
impl_vector!(DVec4, 4);

impl LiftVector for DVec2 {
    type Lifted = DVec3;

    #[inline(always)]
    fn extend(self, time: f64) -> DVec3 {
        DVec2::extend(self, time)
    }

    #[inline(always)]
    fn truncate(lifted: DVec3) -> Self {
        lifted.truncate()
    }
}

impl LiftVector for DVec3 {
    type Lifted = DVec4;

    #[inline(always)]
    fn extend(self, time: f64) -> DVec4 {
        DVec3::extend(self, time)
    }

    #[inline(always)]
    fn truncate(lifted: DVec4) -> Self {
        lifted.truncate()
    }
}
