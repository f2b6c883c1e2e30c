pub mod artifact;
pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod git;
pub mod properties;
pub mod release_info;
pub mod telemetry;
pub mod ui;

pub use error::{ReleaseError, Result};
