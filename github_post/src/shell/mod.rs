//! # Shell Module
//!
//! Entry point and command-line handling for the `github-post` binary.

pub mod cli;

pub use cli::{Cli, open_input, run, run_with};
