//! Scheduling core for a personal task manager.
//!
//! - [`recurrence`] turns recurring templates into concrete tasks, at most one per
//!   template and period, and lints template configuration.
//! - [`zone`] and [`sort`] derive the display order: pinned first, then
//!   urgent, future, undated and finally done tasks.
//! - [`storage`], [`commands`] and [`tui`] wire the core to JSON files and a terminal UI.

pub mod clock;
pub mod commands;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod sort;
pub mod storage;
pub mod tui;
pub mod zone;

pub use error::{Error, Result};
