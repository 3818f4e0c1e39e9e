//! Core round logic for round-panel

mod round_controller;

pub use round_controller::RoundController;
