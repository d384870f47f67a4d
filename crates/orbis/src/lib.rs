pub mod config;
pub mod events;
pub mod geometry;
pub mod layout;
pub mod sys;
