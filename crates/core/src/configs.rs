//! Configuration parsing for the pipeline file and per-run settings

pub mod settings;
pub mod tasks;
