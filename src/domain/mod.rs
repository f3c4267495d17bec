pub mod camera;
pub mod collision;
pub mod collision_map;
pub mod math;
pub mod object;
pub mod pool;
pub mod tile;
pub mod tilemap;
