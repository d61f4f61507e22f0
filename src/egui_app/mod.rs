//! egui front end: a drawing canvas beside the ranked candidate list.

pub mod controller;
pub mod state;
pub mod ui;
