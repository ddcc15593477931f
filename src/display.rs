//! Output sinks and the debug/trace toggle (spec.md §6 "Output": "two
//! write sinks ... plus two width providers ... plus one error-formatter
//! hook").
//!
//! Grounded in the teacher's `display::debug_print`/`debug_struct`
//! (`once_cell`-backed global toggle + `colored` terminal styling),
//! trimmed of the teacher's unrelated table/box/progress-bar helpers,
//! which have no counterpart in spec.md.

use colored::Colorize;
use once_cell::sync::Lazy;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// The boundary through which every help/error render passes. Swapping
/// `out`/`err` lets a host capture output in tests instead of writing to
/// the real terminal.
pub struct OutputSinks {
    pub out: Box<dyn Write>,
    pub err: Box<dyn Write>,
    pub out_width: Box<dyn Fn() -> usize>,
    pub err_width: Box<dyn Fn() -> usize>,
    pub format_error: Box<dyn Fn(&crate::error::Error) -> String>,
}

impl Default for OutputSinks {
    fn default() -> Self {
        Self {
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
            out_width: Box::new(|| 80),
            err_width: Box::new(|| 80),
            format_error: Box::new(|e| format!("error: {}", e.message)),
        }
    }
}

impl OutputSinks {
    pub fn write_out(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn write_err(&mut self, text: &str) {
        let _ = writeln!(self.err, "{text}");
    }

    /// Formats and writes `err` through the error-formatter hook: the
    /// single place a host may override how a structured `Error` becomes
    /// terminal text (spec.md §6/§7).
    pub fn report_error(&mut self, error: &crate::error::Error) {
        let rendered = (self.format_error)(error);
        self.write_err(&rendered);
    }
}

static DEBUG_ENABLED: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Prints a labeled trace line to stderr, gated on the global debug
/// toggle. Used by the dispatcher to trace token-parse/resolve steps.
pub fn debug_print(label: &str, message: &str) {
    if is_debug_enabled() {
        eprintln!("{} {}: {}", "[DEBUG]".bright_magenta().bold(), label.cyan(), message.white());
    }
}

pub fn debug_struct<T: std::fmt::Debug>(label: &str, data: &T) {
    if is_debug_enabled() {
        eprintln!("{} {}:\n{:#?}", "[DEBUG]".bright_magenta().bold(), label.cyan(), data);
    }
}
