//! gymtrack server, client and terminal runner.
//!
//! The pure logic lives in [`gymtrack_core`]; this crate wires it to SQLite, an
//! HTTP API, the food-image analyzer and the daily reminder.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod nutrition;
pub mod reminder;
pub mod render;
pub mod runner;

pub use gymtrack_core::{models, schedule, stats, timer, workout};
