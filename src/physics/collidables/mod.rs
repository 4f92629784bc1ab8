pub mod shape;

// Static primitives
pub mod point;
pub mod polytope;
pub mod box_shape;
pub mod convex_hull;

// Space-time primitives
pub mod moving_polytope;

pub use self::box_shape::Aabb;
pub use self::convex_hull::ConvexHull;
pub use self::moving_polytope::MovingPolytope;
pub use self::point::Point;
pub use self::polytope::{Polytope, MAX_POLYTOPE_POINT_COUNT};
pub use self::shape::IPrimitiveView;
