//! SenseKit Manager Library
//!
//! Command implementations behind the `sensekit` binary.

pub mod commands;
