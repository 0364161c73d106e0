//! Command-line front end for `guidecheck`.

pub mod cli;
pub mod config;
pub mod logging;
mod render;
