//! Shared utilities (hex dump formatting, source path expansion, conversion journal).

#[cfg(feature = "cli")]
pub mod fs;
pub mod hex;
#[cfg(feature = "cli")]
pub mod journal;
