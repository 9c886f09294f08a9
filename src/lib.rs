//! Immich geodata installer library
//!
//! Downloads a geodata release, checks that the requested tag exists, and
//! optionally installs its `geodata` and `i18n-iso-countries` directories
//! into a running Immich tree.

pub mod cli;
pub mod config;
pub mod install;
