use std::marker::PhantomData;

use crate::error::GjkError;
use crate::physics::collidables::shape::IPrimitiveView;
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::math_helper;
use crate::utilities::vector::Vector;

/// Largest number of vertices a polytope may be built from.
pub const MAX_POLYTOPE_POINT_COUNT: usize = 20;

/// Convex hull of a fixed number of points.
///
/// Serialized as `[r², center, p_0, ..., p_{N-1}]` where `center` is the vertex average and `r²` the largest
/// squared distance of a vertex from it.
#[derive(Clone, Copy, Debug)]
pub struct Polytope<'a, V: Vector> {
    row: &'a [f64],
    point_count: usize,
    _vector: PhantomData<V>,
}

impl<'a, V: Vector> Polytope<'a, V> {
    /// Creates an unbound view for polytopes with `point_count` vertices.
    pub fn new(point_count: usize) -> Result<Self, GjkError> {
        if point_count == 0 || point_count > MAX_POLYTOPE_POINT_COUNT {
            return Err(GjkError::UnsupportedPointCount {
                count: point_count,
                max: MAX_POLYTOPE_POINT_COUNT,
            });
        }
        Ok(Self {
            row: &[],
            point_count,
            _vector: PhantomData,
        })
    }

    /// Number of `f64` slots of one serialized polytope with `point_count` vertices.
    #[inline(always)]
    pub const fn row_size(point_count: usize) -> usize {
        1 + (1 + point_count) * V::DIM
    }

    #[inline(always)]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Vertex `j` of the bound polytope.
    #[inline(always)]
    pub fn vertex(&self, j: usize) -> V {
        let start = 1 + (1 + j) * V::DIM;
        V::from_slice(&self.row[start..start + V::DIM])
    }

    /// Serializes the convex hull of `points` into `row`.
    pub fn write_row(row: &mut [f64], points: &[V]) {
        Self::write_row_with(row, points.len(), |j| points[j]);
    }

    /// Serializes the convex hull of the points `coords[indices[j]]`, where `coords` is a flat list of
    /// `V::DIM`-tuples.
    pub fn write_row_from_index_list(row: &mut [f64], coords: &[f64], indices: &[usize]) {
        Self::write_row_with(row, indices.len(), |j| {
            V::from_slice(&coords[V::DIM * indices[j]..V::DIM * (indices[j] + 1)])
        });
    }

    fn write_row_with(row: &mut [f64], point_count: usize, point: impl Fn(usize) -> V) {
        debug_assert!(point_count > 0 && row.len() >= Self::row_size(point_count));
        let mut center = V::ZERO;
        for j in 0..point_count {
            let p = point(j);
            let start = 1 + (1 + j) * V::DIM;
            p.write_to_slice(&mut row[start..start + V::DIM]);
            center = center + p;
        }
        center = center * (1.0 / point_count as f64);

        let mut r2: f64 = 0.0;
        for j in 0..point_count {
            r2 = math_helper::max(r2, (point(j) - center).length_squared());
        }
        row[0] = r2;
        center.write_to_slice(&mut row[1..1 + V::DIM]);
    }
}

impl<'a, V: Vector> IPrimitiveView<'a> for Polytope<'a, V> {
    #[inline(always)]
    fn size(&self) -> usize {
        Self::row_size(self.point_count)
    }

    #[inline(always)]
    fn bind(&mut self, row: &'a [f64]) {
        debug_assert!(row.len() >= self.size());
        self.row = row;
    }
}

impl<'a, V: Vector> IConvexPrimitive<V> for Polytope<'a, V> {
    fn min_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let mut pos = 0;
        let mut minimum = self.vertex(0).dot(dir);
        for j in 1..self.point_count {
            let value = self.vertex(j).dot(dir);
            if value < minimum {
                pos = j;
                minimum = value;
            }
        }
        *supp = self.vertex(pos);
        minimum
    }

    fn max_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let mut pos = 0;
        let mut maximum = self.vertex(0).dot(dir);
        for j in 1..self.point_count {
            let value = self.vertex(j).dot(dir);
            if value > maximum {
                pos = j;
                maximum = value;
            }
        }
        *supp = self.vertex(pos);
        maximum
    }

    fn min_max_support_value(&self, dir: V) -> (f64, f64) {
        let first = self.vertex(0).dot(dir);
        (1..self.point_count).fold((first, first), |(lo, hi), j| {
            let value = self.vertex(j).dot(dir);
            (math_helper::min(lo, value), math_helper::max(hi, value))
        })
    }

    #[inline(always)]
    fn interior_point(&self) -> V {
        V::from_slice(&self.row[1..1 + V::DIM])
    }

    #[inline(always)]
    fn interior_point_coordinate(&self, k: usize) -> f64 {
        self.row[1 + k]
    }

    #[inline(always)]
    fn squared_radius(&self) -> f64 {
        self.row[0]
    }
}
