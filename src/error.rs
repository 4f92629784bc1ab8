use thiserror::Error;

/// Fatal errors raised while constructing primitives or setting up batch queries.
///
/// Query outcomes are never reported through this type; the GJK core signals termination through
/// [`GjkReason`](crate::physics::collision_detection::gjk_distance_tester::GjkReason) and plain return values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GjkError {
    /// A fixed-size polytope family does not provide the requested vertex count.
    #[error("unsupported point count {count}: polytopes support between 1 and {max} points")]
    UnsupportedPointCount { count: usize, max: usize },
    /// A bounding volume was requested for an empty set of points or primitives.
    #[error("cannot build a bounding volume from an empty set")]
    EmptyPointSet,
    /// A flat buffer does not hold the number of values implied by the primitive layout.
    #[error("buffer `{name}` holds {actual} values, expected at least {expected}")]
    BufferSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A result slice does not match the number of primitive pairs.
    #[error("result slice holds {actual} entries, expected {expected}")]
    ResultLength { expected: usize, actual: usize },
    /// Batch dispatch needs at least one worker.
    #[error("thread count must be at least 1")]
    InvalidThreadCount,
    /// A worker thread panicked during batch dispatch.
    #[error("a batch worker thread panicked")]
    WorkerPanicked,
}
