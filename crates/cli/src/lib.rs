//! Command implementations behind the `sector-alloc` binary.

pub mod commands;
