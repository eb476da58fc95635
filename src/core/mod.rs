//! Core configuration and error handling

pub mod config;
pub mod error;


pub use config::{
    ConfigError, ConfigResult, ConfigSource, FileConfigSource, ServiceConfig, StaticConfigSource,
    ENV_PREFIX,
};
pub use error::{Result, ServiceError};
