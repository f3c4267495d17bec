pub mod entities;
pub mod event;
pub mod level;
pub mod stage;
