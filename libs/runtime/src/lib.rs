//! Process bootstrap shared by the server binary: layered configuration and
//! logging initialisation.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, CliArgs, ConfigError, DatabaseConfig, LoggingConfig,
    Section, ServerConfig,
};
pub use logging::init_logging_from_config;
