//! egui front end: controller state machine, UI state, and renderer.

pub mod controller;
pub mod state;
pub mod ui;
