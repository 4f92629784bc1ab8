use std::marker::PhantomData;

use crate::physics::collidables::shape::IPrimitiveView;
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::vector::Vector;

/// A single point. Serialized as `[0, x_1, ..., x_D]`; the leading slot is the (zero) squared radius.
#[derive(Clone, Copy, Debug, Default)]
pub struct Point<'a, V: Vector> {
    row: &'a [f64],
    _vector: PhantomData<V>,
}

impl<'a, V: Vector> Point<'a, V> {
    /// Number of `f64` slots of one serialized point.
    pub const SIZE: usize = 1 + V::DIM;

    /// Creates an unbound view. It must be bound before any support query.
    #[inline]
    pub fn new() -> Self {
        Self {
            row: &[],
            _vector: PhantomData,
        }
    }

    /// Creates a view bound to `row`.
    #[inline]
    pub fn from_row(row: &'a [f64]) -> Self {
        Self {
            row,
            _vector: PhantomData,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> V {
        V::from_slice(&self.row[1..])
    }

    /// Serializes `point` into `row`.
    #[inline]
    pub fn write_row(row: &mut [f64], point: V) {
        row[0] = 0.0;
        point.write_to_slice(&mut row[1..Self::SIZE]);
    }
}

impl<'a, V: Vector> IPrimitiveView<'a> for Point<'a, V> {
    #[inline(always)]
    fn size(&self) -> usize {
        Self::SIZE
    }

    #[inline(always)]
    fn bind(&mut self, row: &'a [f64]) {
        debug_assert!(row.len() >= Self::SIZE);
        self.row = row;
    }
}

impl<'a, V: Vector> IConvexPrimitive<V> for Point<'a, V> {
    #[inline(always)]
    fn min_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        *supp = self.position();
        supp.dot(dir)
    }

    #[inline(always)]
    fn max_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        self.min_support_vector(dir, supp)
    }

    #[inline(always)]
    fn min_max_support_value(&self, dir: V) -> (f64, f64) {
        let value = self.position().dot(dir);
        (value, value)
    }

    #[inline(always)]
    fn interior_point(&self) -> V {
        self.position()
    }

    #[inline(always)]
    fn interior_point_coordinate(&self, k: usize) -> f64 {
        self.row[1 + k]
    }

    #[inline(always)]
    fn squared_radius(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_support_is_the_point() {
        let mut row = [9.0; 3];
        Point::write_row(&mut row, DVec2::new(3.0, 4.0));
        assert_eq!(row, [0.0, 3.0, 4.0]);

        let point = Point::<DVec2>::from_row(&row);
        let (value, supp) = point.support(DVec2::new(1.0, -1.0), true);
        assert_eq!(supp, DVec2::new(3.0, 4.0));
        assert_eq!(value, -1.0);
        assert_eq!(point.support(DVec2::X, false).0, 3.0);
        assert_eq!(point.min_max_support_value(DVec2::Y), (4.0, 4.0));
        assert_eq!(point.interior_point_coordinate(1), 4.0);
        assert_eq!(point.squared_radius(), 0.0);
        assert!(point.as_aabb().is_none());
    }

    #[test]
    fn test_rebind() {
        let buffer = [0.0, 1.0, 2.0, 0.0, 5.0, 6.0];
        let mut point = Point::<DVec2>::new();
        assert_eq!(point.row_count(&buffer), 2);
        point.rebind(&buffer, 1);
        assert_eq!(point.interior_point(), DVec2::new(5.0, 6.0));
    }
}
