//! Worker thread that owns the async runtime and performs all I/O.

pub mod commands;
pub mod runtime;
