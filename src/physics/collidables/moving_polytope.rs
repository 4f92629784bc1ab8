use std::marker::PhantomData;

use crate::error::GjkError;
use crate::physics::collidables::polytope::{Polytope, MAX_POLYTOPE_POINT_COUNT};
use crate::physics::collision_detection::support_finder::{IConvexPrimitive, IMovingPrimitive};
use crate::utilities::math_helper;
use crate::utilities::vector::LiftVector;

/// A polytope whose vertices move with constant velocities, seen as a static body in space-time.
///
/// Over the time window `[a, b]` the body is the convex hull of the polytope at time `a` and the polytope at time `b`,
/// with the time coordinate of a point at time `t` being `t * time_scale`. Since every vertex moves linearly, that hull
/// contains the whole swept volume.
///
/// Two rows back a moving polytope:
/// * coordinates, laid out as a [`Polytope`] row: `[r², center, p_0, ..., p_{N-1}]`;
/// * velocities: `[w, average_velocity, v_0, ..., v_{N-1}, |average_velocity|]`, where `w` is the largest distance of a
///   vertex velocity from the average velocity.
#[derive(Clone, Copy, Debug)]
pub struct MovingPolytope<'a, V: LiftVector> {
    coordinates: &'a [f64],
    velocities: &'a [f64],
    point_count: usize,
    a: f64,
    b: f64,
    time_scale: f64,
    _vector: PhantomData<V>,
}

impl<'a, V: LiftVector> MovingPolytope<'a, V> {
    /// Creates an unbound view for polytopes with `point_count` vertices, covering the time window `[0, 1]`.
    pub fn new(point_count: usize) -> Result<Self, GjkError> {
        if point_count == 0 || point_count > MAX_POLYTOPE_POINT_COUNT {
            return Err(GjkError::UnsupportedPointCount {
                count: point_count,
                max: MAX_POLYTOPE_POINT_COUNT,
            });
        }
        Ok(Self {
            coordinates: &[],
            velocities: &[],
            point_count,
            a: 0.0,
            b: 1.0,
            time_scale: 1.0,
            _vector: PhantomData,
        })
    }

    #[inline(always)]
    pub const fn coordinate_size(point_count: usize) -> usize {
        Polytope::<V>::row_size(point_count)
    }

    #[inline(always)]
    pub const fn velocity_size(point_count: usize) -> usize {
        1 + (1 + point_count) * V::DIM + 1
    }

    #[inline(always)]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    #[inline]
    pub fn bind(&mut self, coordinates: &'a [f64], velocities: &'a [f64]) {
        debug_assert!(coordinates.len() >= Self::coordinate_size(self.point_count));
        debug_assert!(velocities.len() >= Self::velocity_size(self.point_count));
        self.coordinates = coordinates;
        self.velocities = velocities;
    }

    /// Binds to row `index` of a coordinate buffer and its matching velocity buffer.
    #[inline]
    pub fn rebind(&mut self, coordinates: &'a [f64], velocities: &'a [f64], index: usize) {
        let coordinate_size = Self::coordinate_size(self.point_count);
        let velocity_size = Self::velocity_size(self.point_count);
        self.bind(
            &coordinates[coordinate_size * index..coordinate_size * (index + 1)],
            &velocities[velocity_size * index..velocity_size * (index + 1)],
        );
    }

    /// Number of rows in a coordinate buffer.
    #[inline]
    pub fn row_count(&self, coordinates: &[f64]) -> usize {
        coordinates.len() / Self::coordinate_size(self.point_count)
    }

    #[inline(always)]
    pub fn vertex(&self, j: usize) -> V {
        let start = 1 + (1 + j) * V::DIM;
        V::from_slice(&self.coordinates[start..start + V::DIM])
    }

    #[inline(always)]
    pub fn velocity(&self, j: usize) -> V {
        let start = 1 + (1 + j) * V::DIM;
        V::from_slice(&self.velocities[start..start + V::DIM])
    }

    #[inline(always)]
    pub fn center(&self) -> V {
        V::from_slice(&self.coordinates[1..1 + V::DIM])
    }

    #[inline(always)]
    pub fn average_velocity(&self) -> V {
        V::from_slice(&self.velocities[1..1 + V::DIM])
    }

    #[inline(always)]
    pub fn max_velocity_deviation(&self) -> f64 {
        self.velocities[0]
    }

    #[inline(always)]
    pub fn average_speed(&self) -> f64 {
        self.velocities[Self::velocity_size(self.point_count) - 1]
    }

    /// Serializes the vertex positions. Same layout as [`Polytope::write_row`].
    #[inline]
    pub fn write_coordinate_row(row: &mut [f64], points: &[V]) {
        Polytope::write_row(row, points);
    }

    /// Serializes the vertex positions `coords[indices[j]]` from a flat list of `V::DIM`-tuples.
    #[inline]
    pub fn write_coordinate_row_from_index_list(row: &mut [f64], coords: &[f64], indices: &[usize]) {
        Polytope::<V>::write_row_from_index_list(row, coords, indices);
    }

    /// Serializes the vertex velocities.
    pub fn write_velocity_row(row: &mut [f64], velocities: &[V]) {
        Self::write_velocity_row_with(row, velocities.len(), |j| velocities[j]);
    }

    /// Serializes the vertex velocities `velocities[indices[j]]` from a flat list of `V::DIM`-tuples.
    pub fn write_velocity_row_from_index_list(row: &mut [f64], velocities: &[f64], indices: &[usize]) {
        Self::write_velocity_row_with(row, indices.len(), |j| {
            V::from_slice(&velocities[V::DIM * indices[j]..V::DIM * (indices[j] + 1)])
        });
    }

    fn write_velocity_row_with(row: &mut [f64], point_count: usize, velocity: impl Fn(usize) -> V) {
        debug_assert!(point_count > 0 && row.len() >= Self::velocity_size(point_count));
        let mut average = V::ZERO;
        for j in 0..point_count {
            let v = velocity(j);
            let start = 1 + (1 + j) * V::DIM;
            v.write_to_slice(&mut row[start..start + V::DIM]);
            average = average + v;
        }
        average = average * (1.0 / point_count as f64);

        let mut deviation: f64 = 0.0;
        for j in 0..point_count {
            deviation = math_helper::max(deviation, (velocity(j) - average).length_squared());
        }
        row[0] = deviation.sqrt();
        average.write_to_slice(&mut row[1..1 + V::DIM]);
        row[Self::velocity_size(point_count) - 1] = average.length_squared().sqrt();
    }

    /// Writes the [`Polytope`] row of the vertices advanced to time `t`.
    pub fn write_deformed(&self, row: &mut [f64], t: f64) {
        let mut points = [V::ZERO; MAX_POLYTOPE_POINT_COUNT];
        for (j, point) in points[..self.point_count].iter_mut().enumerate() {
            *point = self.vertex(j) + self.velocity(j) * t;
        }
        Polytope::write_row(row, &points[..self.point_count]);
    }

    /// Extreme values of `dot(d, p_j + t * v_j)` at `t = a` and `t = b` with the vertices realizing them.
    /// Returns `((value_a, j_a), (value_b, j_b))`.
    #[inline]
    fn spatial_extremes(&self, d: V, maximize: bool) -> ((f64, usize), (f64, usize)) {
        let better = |value: f64, best: f64| if maximize { value > best } else { value < best };
        let pd = self.vertex(0).dot(d);
        let vd = self.velocity(0).dot(d);
        let mut at_a = (pd + self.a * vd, 0);
        let mut at_b = (pd + self.b * vd, 0);
        for j in 1..self.point_count {
            let pd = self.vertex(j).dot(d);
            let vd = self.velocity(j).dot(d);
            let value = pd + self.a * vd;
            if better(value, at_a.0) {
                at_a = (value, j);
            }
            let value = pd + self.b * vd;
            if better(value, at_b.0) {
                at_b = (value, j);
            }
        }
        (at_a, at_b)
    }

    #[inline]
    fn lifted_point(&self, j: usize, t: f64) -> V::Lifted {
        (self.vertex(j) + self.velocity(j) * t).extend(t * self.time_scale)
    }

    fn extreme_support(&self, dir: V::Lifted, supp: &mut V::Lifted, maximize: bool) -> f64 {
        let d = V::truncate(dir);
        let dt = dir[V::DIM] * self.time_scale;
        let ((value_a, j_a), (value_b, j_b)) = self.spatial_extremes(d, maximize);
        let value_a = value_a + self.a * dt;
        let value_b = value_b + self.b * dt;
        // Ties go to the earlier time.
        let take_a = if maximize { value_a >= value_b } else { value_a <= value_b };
        if take_a {
            *supp = self.lifted_point(j_a, self.a);
            value_a
        } else {
            *supp = self.lifted_point(j_b, self.b);
            value_b
        }
    }
}

impl<'a, V: LiftVector> IConvexPrimitive<V::Lifted> for MovingPolytope<'a, V> {
    #[inline]
    fn min_support_vector(&self, dir: V::Lifted, supp: &mut V::Lifted) -> f64 {
        self.extreme_support(dir, supp, false)
    }

    #[inline]
    fn max_support_vector(&self, dir: V::Lifted, supp: &mut V::Lifted) -> f64 {
        self.extreme_support(dir, supp, true)
    }

    fn min_max_support_value(&self, dir: V::Lifted) -> (f64, f64) {
        let d = V::truncate(dir);
        let dt = dir[V::DIM] * self.time_scale;
        let ((min_a, _), (min_b, _)) = self.spatial_extremes(d, false);
        let ((max_a, _), (max_b, _)) = self.spatial_extremes(d, true);
        (
            math_helper::min(min_a + self.a * dt, min_b + self.b * dt),
            math_helper::max(max_a + self.a * dt, max_b + self.b * dt),
        )
    }

    /// Average vertex position in the middle of the time window.
    #[inline]
    fn interior_point(&self) -> V::Lifted {
        let t = 0.5 * (self.a + self.b);
        (self.center() + self.average_velocity() * t).extend(t * self.time_scale)
    }

    fn squared_radius(&self) -> f64 {
        let s = 0.5 * (self.b - self.a).abs();
        let spatial =
            s * self.average_speed() + self.coordinates[0].sqrt() + self.max_velocity_deviation() * self.b.abs();
        let temporal = s * self.time_scale;
        spatial * spatial + temporal * temporal
    }
}

impl<'a, V: LiftVector> IMovingPrimitive<V> for MovingPolytope<'a, V> {
    #[inline(always)]
    fn first_time(&self) -> f64 {
        self.a
    }

    #[inline(always)]
    fn second_time(&self) -> f64 {
        self.b
    }

    #[inline(always)]
    fn time_scale(&self) -> f64 {
        self.time_scale
    }

    #[inline(always)]
    fn set_first_time(&mut self, a: f64) {
        self.a = a;
    }

    #[inline(always)]
    fn set_second_time(&mut self, b: f64) {
        self.b = b;
    }

    #[inline(always)]
    fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = time_scale;
    }
}
