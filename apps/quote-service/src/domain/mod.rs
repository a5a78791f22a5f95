//! Domain Layer - Quote types and rotation bookkeeping.
//!
//! Pure types with no I/O. Everything here is usable from tests without a
//! runtime.

/// Quote snapshots, symbols and display names.
pub mod quote;

/// Round-robin rotation over the predefined symbol list.
pub mod rotation;
