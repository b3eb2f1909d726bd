//! # mmapio Configuration Module
//!
//! Centralizes the constants used by the mode parser and the alignment
//! correction. Runtime configuration of a single mapping goes through
//! [`MapOptions`](crate::MapOptions) instead.
//!
//! ## Module Organization
//!
//! - [`constants`]: Mode tokens, scan bounds, and granularity sentinels

pub mod constants;
pub use constants::*;
