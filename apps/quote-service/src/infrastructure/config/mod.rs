//! Configuration Module
//!
//! Configuration loading for the quote service.

mod settings;

pub use settings::{
    AlphaVantageSettings, ConfigError, Credentials, SchedulerSettings, ServerSettings,
    ServiceConfig,
};
