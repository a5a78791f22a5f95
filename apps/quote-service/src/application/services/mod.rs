//! Application Services
//!
//! - `QuoteService`: cache-first read path with placeholder fallback
//! - `RotationScheduler`: round-robin background cache refresh

mod quote_service;
mod rotation_scheduler;

pub use quote_service::{QuoteDiagnostics, QuoteService};
pub use rotation_scheduler::{RotationScheduler, SchedulerStatus, TickOutcome};
