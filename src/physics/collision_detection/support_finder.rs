use crate::physics::collidables::box_shape::Aabb;
use crate::utilities::vector::{LiftVector, Vector};

/// Support function capability consumed by the GJK distance tester.
///
/// Implementors describe a compact convex set only through its extreme points along arbitrary directions,
/// plus an interior point and an upper bound on the squared distance from it to any point of the set.
/// The trait is object safe so heterogeneous primitives can be combined, e.g. in a convex hull.
pub trait IConvexPrimitive<V: Vector> {
    /// Computes the point of the primitive minimizing `dot(dir, x)`, writes it to `supp` and returns the minimum.
    fn min_support_vector(&self, dir: V, supp: &mut V) -> f64;

    /// Computes the point of the primitive maximizing `dot(dir, x)`, writes it to `supp` and returns the maximum.
    fn max_support_vector(&self, dir: V, supp: &mut V) -> f64;

    /// Returns the extreme value and point of the primitive along `dir`.
    #[inline(always)]
    fn support(&self, dir: V, minimize: bool) -> (f64, V) {
        let mut supp = V::ZERO;
        let value = if minimize {
            self.min_support_vector(dir, &mut supp)
        } else {
            self.max_support_vector(dir, &mut supp)
        };
        (value, supp)
    }

    /// Computes only the values of the min and max support functions. Used to compute bounding boxes.
    fn min_max_support_value(&self, dir: V) -> (f64, f64);

    /// Some point within the primitive.
    fn interior_point(&self) -> V;

    /// Coordinate `k` of [`interior_point`](Self::interior_point).
    #[inline(always)]
    fn interior_point_coordinate(&self, k: usize) -> f64 {
        self.interior_point()[k]
    }

    /// Upper bound on the squared distance from the interior point to any point of the primitive.
    fn squared_radius(&self) -> f64;

    /// Axis-aligned boxes return a view of themselves so that callers can take closed-form fast paths.
    #[inline(always)]
    fn as_aabb(&self) -> Option<Aabb<'_, V>> {
        None
    }
}

/// A primitive moving linearly in `V`, seen as a static convex body in space-time `V::Lifted`.
///
/// The body covers the time window `[first_time, second_time]`; the time coordinate of a point at time `t`
/// is `t * time_scale`.
pub trait IMovingPrimitive<V: LiftVector>: IConvexPrimitive<V::Lifted> {
    fn first_time(&self) -> f64;

    fn second_time(&self) -> f64;

    fn time_scale(&self) -> f64;

    fn set_first_time(&mut self, a: f64);

    fn set_second_time(&mut self, b: f64);

    fn set_time_scale(&mut self, time_scale: f64);
}
