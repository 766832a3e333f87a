//! Utility functions and helpers.

pub mod console;
