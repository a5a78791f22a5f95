//! Alpha Vantage Adapter
//!
//! Implements the `QuoteFetcher` port against the Alpha Vantage
//! `GLOBAL_QUOTE` endpoint.
//!
//! # Modules
//!
//! - `messages`: Typed response structs and mapping to `QuoteSnapshot`
//! - `client`: Rate-limited HTTP client

/// Rate-limited HTTP client.
pub mod client;

/// Response wire types.
pub mod messages;

pub use client::{AlphaVantageClient, AlphaVantageError};
pub use messages::{GlobalQuote, GlobalQuoteResponse};
