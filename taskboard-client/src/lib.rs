//! REST-backed front end for `taskboard-core`.

pub mod cli;
pub mod config;
pub mod log_bridge;
pub mod rest;
