//! Utility functions and helpers
//!
//! This module contains timestamp and day-bucket helpers.

pub mod time;

pub use time::{current_timestamp_millis, daily_bounds, now_in, offset_from_minutes, start_of_day};
