use std::marker::PhantomData;

use crate::error::GjkError;
use crate::physics::collidables::shape::IPrimitiveView;
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::bounding_box::BoundingBox;
use crate::utilities::math_helper;
use crate::utilities::vector::Vector;

/// Axis-aligned box. Serialized as `[r², center, half_extent]` with `r² = |half_extent|²`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Aabb<'a, V: Vector> {
    row: &'a [f64],
    _vector: PhantomData<V>,
}

impl<'a, V: Vector> Aabb<'a, V> {
    /// Number of `f64` slots of one serialized box.
    pub const SIZE: usize = 1 + 2 * V::DIM;

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
    pub fn center(&self) -> V {
        V::from_slice(&self.row[1..1 + V::DIM])
    }

    #[inline(always)]
    pub fn half_extent(&self) -> V {
        V::from_slice(&self.row[1 + V::DIM..Self::SIZE])
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox<V> {
        let center = self.center();
        let half_extent = self.half_extent();
        BoundingBox::new(center - half_extent, center + half_extent)
    }

    /// Closed-form squared distance between two boxes: the sum of the squared gaps between their intervals.
    #[inline]
    pub fn squared_distance(p: &Aabb<'_, V>, q: &Aabb<'_, V>) -> f64 {
        let (p_center, p_half) = (p.center(), p.half_extent());
        let (q_center, q_half) = (q.center(), q.half_extent());
        let mut d2 = 0.0;
        for k in 0..V::DIM {
            let gap = math_helper::ramp(
                math_helper::max(p_center[k] - p_half[k], q_center[k] - q_half[k])
                    - math_helper::min(p_center[k] + p_half[k], q_center[k] + q_half[k]),
            );
            d2 += gap * gap;
        }
        d2
    }

    /// Shortest difference `x - y` with `x` in `p` and `y` in `q`. Zero along axes where the intervals overlap.
    pub fn closest_difference(p: &Aabb<'_, V>, q: &Aabb<'_, V>) -> V {
        let (p_center, p_half) = (p.center(), p.half_extent());
        let (q_center, q_half) = (q.center(), q.half_extent());
        let mut difference = V::ZERO;
        for k in 0..V::DIM {
            let (p_lo, p_hi) = (p_center[k] - p_half[k], p_center[k] + p_half[k]);
            let (q_lo, q_hi) = (q_center[k] - q_half[k], q_center[k] + q_half[k]);
            if p_lo > q_hi {
                difference[k] = p_lo - q_hi;
            } else if q_lo > p_hi {
                difference[k] = p_hi - q_lo;
            }
        }
        difference
    }

    /// Serializes `bounds` into `row`.
    #[inline]
    pub fn write_row(row: &mut [f64], bounds: &BoundingBox<V>) {
        let half_extent = bounds.half_extent();
        row[0] = half_extent.length_squared();
        bounds.center().write_to_slice(&mut row[1..1 + V::DIM]);
        half_extent.write_to_slice(&mut row[1 + V::DIM..Self::SIZE]);
    }

    /// Serializes the bounding box of a flat list of `V::DIM`-tuples into `row`.
    pub fn write_row_from_point_cloud(row: &mut [f64], coords: &[f64]) -> Result<(), GjkError> {
        let mut points = coords.chunks_exact(V::DIM).map(V::from_slice);
        let first = points.next().ok_or(GjkError::EmptyPointSet)?;
        let bounds = points.fold(BoundingBox::new(first, first), |bounds, p| {
            BoundingBox::create_merged(bounds, BoundingBox::new(p, p))
        });
        Self::write_row(row, &bounds);
        Ok(())
    }

    /// Serializes the bounding box of the primitives `begin..end` of `buffer` into `row`.
    ///
    /// `prototype` is rebound onto every row in turn; its extents come from its support values along the axes.
    pub fn write_row_from_primitives<'b, P>(
        row: &mut [f64],
        prototype: &mut P,
        buffer: &'b [f64],
        begin: usize,
        end: usize,
    ) -> Result<(), GjkError>
    where
        P: IPrimitiveView<'b> + IConvexPrimitive<V>,
    {
        let mut bounds: Option<BoundingBox<V>> = None;
        for i in begin..end {
            prototype.rebind(buffer, i);
            let primitive_bounds = BoundingBox::from_primitive(&*prototype);
            bounds = Some(match bounds {
                Some(merged) => BoundingBox::create_merged(merged, primitive_bounds),
                None => primitive_bounds,
            });
        }
        Self::write_row(row, &bounds.ok_or(GjkError::EmptyPointSet)?);
        Ok(())
    }

    /// Overwrites `target` with the smallest box containing both `target` and `other`.
    pub fn merge(target: &mut [f64], other: &[f64]) {
        let merged = BoundingBox::create_merged(
            Aabb::<V>::from_row(&*target).bounding_box(),
            Aabb::<V>::from_row(other).bounding_box(),
        );
        Self::write_row(target, &merged);
    }
}

impl<'a, V: Vector> IPrimitiveView<'a> for Aabb<'a, V> {
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

impl<'a, V: Vector> IConvexPrimitive<V> for Aabb<'a, V> {
    #[inline]
    fn min_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let (center, half_extent) = (self.center(), self.half_extent());
        let mut value = 0.0;
        for k in 0..V::DIM {
            let r = dir[k] * half_extent[k];
            value += dir[k] * center[k] - r.abs();
            supp[k] = center[k] - math_helper::sign(r) * half_extent[k];
        }
        value
    }

    #[inline]
    fn max_support_vector(&self, dir: V, supp: &mut V) -> f64 {
        let (center, half_extent) = (self.center(), self.half_extent());
        let mut value = 0.0;
        for k in 0..V::DIM {
            let r = dir[k] * half_extent[k];
            value += dir[k] * center[k] + r.abs();
            supp[k] = center[k] + math_helper::sign(r) * half_extent[k];
        }
        value
    }

    #[inline]
    fn min_max_support_value(&self, dir: V) -> (f64, f64) {
        let c = self.center().dot(dir);
        let r = self.half_extent().dot(dir.abs());
        (c - r, c + r)
    }

    #[inline(always)]
    fn interior_point(&self) -> V {
        self.center()
    }

    #[inline(always)]
    fn interior_point_coordinate(&self, k: usize) -> f64 {
        self.row[1 + k]
    }

    #[inline(always)]
    fn squared_radius(&self) -> f64 {
        self.row[0]
    }

    #[inline(always)]
    fn as_aabb(&self) -> Option<Aabb<'_, V>> {
        Some(*self)
    }
}
