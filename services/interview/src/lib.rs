//! Interview Service Library Crate
//!
//! Configuration, command line parsing, terminal rendering and the interactive
//! console loop. The `interview` binary is a thin wrapper around this library.

pub mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod render;
