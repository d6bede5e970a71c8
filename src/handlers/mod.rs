//! Built-in markup action handlers.

pub mod emotion;
pub mod movement;
pub mod pause;
