use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::math_helper;
use crate::utilities::vector::Vector;

/// Convex hull of up to `N` borrowed primitives.
///
/// Empty slots are ignored. The hull must contain at least one primitive before it is queried.
#[derive(Clone, Copy)]
pub struct ConvexHull<'a, V: Vector, const N: usize> {
    primitives: [Option<&'a dyn IConvexPrimitive<V>>; N],
    center: V,
    squared_radius: f64,
}

impl<'a, V: Vector, const N: usize> Default for ConvexHull<'a, V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V: Vector, const N: usize> ConvexHull<'a, V, N> {
    pub fn new() -> Self {
        Self {
            primitives: [None; N],
            center: V::ZERO,
            squared_radius: 0.0,
        }
    }

    /// Puts `primitive` into slot `i`, or clears the slot for `None`. Out of range slots are ignored.
    pub fn set(&mut self, i: usize, primitive: Option<&'a dyn IConvexPrimitive<V>>) {
        if let Some(slot) = self.primitives.get_mut(i) {
            *slot = primitive;
            self.refresh_bounds();
        }
    }

    /// Recomputes the averaged center and a radius about it that covers every child's ball.
    fn refresh_bounds(&mut self) {
        let (sum, count) = self
            .children()
            .fold((V::ZERO, 0usize), |(sum, count), child| (sum + child.interior_point(), count + 1));
        let center = sum * (1.0 / count.max(1) as f64);
        let radius = self.children().fold(0.0, |radius, child| {
            let offset = (child.interior_point() - center).length_squared().sqrt();
            math_helper::max(radius, offset + child.squared_radius().sqrt())
        });
        self.center = center;
        self.squared_radius = radius * radius;
    }

    /// Returns true if slot `i` holds no primitive.
    #[inline]
    pub fn is_empty_slot(&self, i: usize) -> bool {
        self.primitives.get(i).map_or(true, Option::is_none)
    }

    #[inline]
    fn children(&self) -> impl Iterator<Item = &'a dyn IConvexPrimitive<V>> + '_ {
        self.primitives.iter().flatten().copied()
    }
}

impl<'a, V: Vector, const N: usize> IConvexPrimitive<V> for ConvexHull<'a, V, N> {
    fn min_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let mut minimum = f64::MAX;
        let mut candidate = V::ZERO;
        for child in self.children() {
            let value = child.min_support_vector(dir, &mut candidate);
            if value < minimum {
                minimum = value;
                *supp = candidate;
            }
        }
        minimum
    }

    fn max_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let mut maximum = f64::MIN;
        let mut candidate = V::ZERO;
        for child in self.children() {
            let value = child.max_support_vector(dir, &mut candidate);
            if value > maximum {
                maximum = value;
                *supp = candidate;
            }
        }
        maximum
    }

    fn min_max_support_value(&self, dir: V) -> (f64, f64) {
        self.children().fold((f64::MAX, f64::MIN), |(lo, hi), child| {
            let (child_lo, child_hi) = child.min_max_support_value(dir);
            (math_helper::min(lo, child_lo), math_helper::max(hi, child_hi))
        })
    }

    /// Average of the interior points of the children.
    #[inline]
    fn interior_point(&self) -> V {
        self.center
    }

    /// Squared radius about [`Self::interior_point`]: the largest `(|c_i - center| + r_i)²` over the children.
    #[inline]
    fn squared_radius(&self) -> f64 {
        self.squared_radius
    }
}
