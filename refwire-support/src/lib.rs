//! # Refwire Support
//!
//! Shared utilities for the refwire crates.
//!
//! This crate provides:
//! - Text rendering for error messages (resolution paths, label sets,
//!   candidate lists, type-name shortening and suggestions)

pub mod rendering;
