// Configuration management module
// TOML settings for the server and each configurable tool

pub mod settings;

pub use settings::{Config, ConfigError, ServerConfig};
