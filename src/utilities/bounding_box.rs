use crate::error::GjkError;
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::math_helper;
use crate::utilities::vector::Vector;

/// Provides simple axis-aligned bounding box functionality in any supported dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<V: Vector> {
    /// Location with the lowest coordinates in the axis-aligned bounding box.
    pub min: V,
    /// Location with the highest coordinates in the axis-aligned bounding box.
    pub max: V,
}

impl<V: Vector> BoundingBox<V> {
    /// Constructs a bounding box from the specified minimum and maximum.
    #[inline]
    pub fn new(min: V, max: V) -> Self {
        Self { min, max }
    }

    /// Computes the tightest bounding box around a set of points.
    pub fn from_points(points: &[V]) -> Result<Self, GjkError> {
        let (first, rest) = points.split_first().ok_or(GjkError::EmptyPointSet)?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.min = bounds.min.component_min(*point);
            bounds.max = bounds.max.component_max(*point);
        }
        Ok(bounds)
    }

    /// Computes the bounding box of a primitive from its support values along the coordinate axes.
    pub fn from_primitive(primitive: &(impl IConvexPrimitive<V> + ?Sized)) -> Self {
        let mut min = V::ZERO;
        let mut max = V::ZERO;
        for k in 0..V::DIM {
            let (lo, hi) = primitive.min_max_support_value(V::unit(k));
            min[k] = lo;
            max[k] = hi;
        }
        Self { min, max }
    }

    /// Expands the box so that it also contains `other`.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        *self = Self::create_merged(*self, *other);
    }

    /// Computes a bounding box which contains two other bounding boxes.
    #[inline]
    pub fn create_merged(a: Self, b: Self) -> Self {
        Self {
            min: a.min.component_min(b.min),
            max: a.max.component_max(b.max),
        }
    }

    /// Determines if a bounding box intersects another bounding box. Touching boxes intersect.
    #[inline]
    pub fn intersects(a: &Self, b: &Self) -> bool {
        (0..V::DIM).all(|k| a.max[k] >= b.min[k] && b.max[k] >= a.min[k])
    }

    /// Computes the squared distance between two boxes, zero when they intersect.
    #[inline]
    pub fn squared_distance(a: &Self, b: &Self) -> f64 {
        let mut d2 = 0.0;
        for k in 0..V::DIM {
            let gap = math_helper::ramp(math_helper::max(a.min[k], b.min[k]) - math_helper::min(a.max[k], b.max[k]));
            d2 += gap * gap;
        }
        d2
    }

    #[inline]
    pub fn center(&self) -> V {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extent(&self) -> V {
        (self.max - self.min) * 0.5
    }

    /// Squared distance from the center to any corner.
    #[inline]
    pub fn squared_radius(&self) -> f64 {
        self.half_extent().length_squared()
    }
}
