pub mod aabb;
pub mod vec2;
