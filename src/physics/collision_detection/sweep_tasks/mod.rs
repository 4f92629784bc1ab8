pub mod convex_pair_sweep_task;

pub use convex_pair_sweep_task::{CollisionFinder, SweepSettings, BISECTION_STACK_CAPACITY};
