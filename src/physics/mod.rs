pub mod collidables;
pub mod collision_detection;
