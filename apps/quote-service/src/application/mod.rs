//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (quote provider).
pub mod ports;

/// Application services for the quote read path and background refresh.
pub mod services;
