//! Shared utilities for the calraw workspace.
//!
//! - **Logging**: tracing subscriber setup shared by every binary
//! - **Humanize**: byte-size and relative-time formatting for operator output

pub mod humanize;
pub mod logging;
