//! hitwatch-runtime: CLI wiring for the hitwatch traffic monitor.
//! Reads access-log records, feeds the alert window and the interval
//! reporter, and prints what they produce.

pub mod cli;
pub mod config;
pub mod follow;
pub mod pipeline;
pub mod render;
pub mod run;
