//! Persistence: the TOML runtime config and the JSON profile directory.

pub mod config;
pub mod profiles;
