// src/utils/console.rs

//! Formatted console output for reports and run progress.
//!
//! Lines carry a timestamp and level prefix so report output lines up with
//! the `env_logger` stream. Diagnostics go through the `log` macros instead.

use std::sync::OnceLock;

use chrono::Local;

/// Output level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Quiet,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info | Level::Quiet => "INFO",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" | "trace" => Level::Debug,
            "quiet" | "off" | "error" | "warn" => Level::Quiet,
            _ => Level::Info,
        }
    }
}

static LEVEL: OnceLock<Level> = OnceLock::new();

/// Set the console level once at start-up.
pub fn init(level: &str) {
    let _ = LEVEL.set(Level::parse(level));
}

fn enabled() -> bool {
    LEVEL.get().copied().unwrap_or(Level::Info) <= Level::Info
}

fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level.as_str(), message)
}

fn emit(message: &str) {
    if enabled() {
        println!("{}", format_line(Level::Info, message));
    }
}

/// Plain report line
pub fn info(message: &str) {
    emit(message);
}

/// Completion line, shown regardless of level
pub fn success(message: &str) {
    println!("{}", format_line(Level::Info, message));
}

/// A step in a multi-step run
pub fn step(step_num: usize, total: usize, message: &str) {
    emit(&format!("[STEP {}/{}] {}", step_num, total, message));
}

pub fn separator() {
    emit(&"─".repeat(70));
}

pub fn header(title: &str) {
    let border = "═".repeat(70);
    emit(&border);
    emit(&format!("  {}", title));
    emit(&border);
}

/// Indented detail line
pub fn sub_item(message: &str) {
    emit(&format!("    {}", message));
}

/// Titled key/value block
pub fn summary(title: &str, items: &[(&str, String)]) {
    if !enabled() {
        return;
    }
    println!();
    emit(&format!("[SUMMARY] {}", title));
    for (key, value) in items {
        emit(&format!("    {}: {}", key, value));
    }
}
