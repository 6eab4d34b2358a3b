pub mod collision;
pub mod movement;
pub mod obstacle;
pub mod physics;
