pub mod bounding_box;
pub mod math_helper;
pub mod thread_dispatcher;
pub mod vector;

pub use self::bounding_box::BoundingBox;
pub use self::thread_dispatcher::ThreadDispatcher;
pub use self::vector::{LiftVector, Vector, MAX_DIMENSION};
