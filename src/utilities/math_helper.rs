/// Square root of the machine epsilon of `f64` (exactly 2^-26).
///
/// Used as the relative convergence threshold of GJK and as the strict positivity bound on barycentric coordinates.
pub const EPS: f64 = 1.490_116_119_384_765_6e-8;

/// `EPS * EPS`, the relative tolerance applied to squared radii when no explicit collision tolerance is given.
pub const EPS_SQUARED: f64 = EPS * EPS;

/// Clamps a value between a minimum and maximum value.
#[inline(always)]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Returns the higher value of the two parameters.
#[inline(always)]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if a > b {
        a
    } else {
        b
    }
}

/// Returns the lower value of the two parameters.
#[inline(always)]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b {
        a
    } else {
        b
    }
}

/// Returns `x` for positive `x` and zero otherwise.
#[inline(always)]
pub fn ramp(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Returns -1, 0 or 1 according to the sign of `x`. Zero maps to zero so that the support point of a box
/// along a degenerate direction is its center.
#[inline(always)]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
