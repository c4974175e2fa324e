#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detail;
pub mod episodes;
pub mod error;
pub mod formats;
pub mod logging;
pub mod playlist;
pub mod probe;
pub mod queue;
pub mod search;
pub mod sources;
pub mod upstream;
