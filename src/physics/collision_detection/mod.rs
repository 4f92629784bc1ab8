pub mod facet_table;
pub mod gjk_batch;
pub mod gjk_distance_tester;
pub mod support_finder;
pub mod sweep_tasks;

pub use self::gjk_distance_tester::{GJKDistanceTester, GjkReason, GjkSettings, Witnesses};
pub use self::support_finder::{IConvexPrimitive, IMovingPrimitive};
