//! Distance queries between convex primitives given by support functions, built on the
//! Gilbert-Johnson-Keerthi algorithm, and conservative advancement for linearly moving primitives.
//!
//! Primitives are non-owning views over rows of caller owned `f64` buffers. A [`GJKDistanceTester`] answers one query
//! at a time and is reused across queries; the batch drivers in
//! [`gjk_batch`](physics::collision_detection::gjk_batch) spread many pairs over worker threads.

mod error;
pub mod physics;
pub mod utilities;

pub use error::GjkError;
pub use physics::collidables::{Aabb, ConvexHull, IPrimitiveView, MovingPolytope, Point, Polytope};
pub use physics::collision_detection::sweep_tasks::{CollisionFinder, SweepSettings};
pub use physics::collision_detection::{
    GJKDistanceTester, GjkReason, GjkSettings, IConvexPrimitive, IMovingPrimitive, Witnesses,
};
pub use utilities::{BoundingBox, LiftVector, ThreadDispatcher, Vector};
