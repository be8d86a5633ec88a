//! Utility Functions
//!
//! User-friendly error formatting for the replay binary.

pub mod errors;

pub use errors::format_user_error;
