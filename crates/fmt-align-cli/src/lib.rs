//! FMT Align CLI - argument handling and run loop of the `fmt-align` binary

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod args;
pub mod run;

pub use args::{parse_from, Args, USAGE};
pub use run::{run, RunContext, RunReport};
