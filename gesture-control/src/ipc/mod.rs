//! IPC formats: s-expression parsing and event rendering.

pub mod sexp;

pub use sexp::format_event;
