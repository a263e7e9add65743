//! Shared types, adapter traits, and core utilities for Quillpad.
//!
//! This crate contains the foundational types shared between the app crate,
//! the sync layer, and the storage adapter implementations. Extracting these
//! into a separate crate lets adapters compile in parallel with the feature
//! crates.

#![forbid(unsafe_code)]

pub mod error;
pub mod prelude;
pub mod store_adapter;
pub mod utils;

// vim: ts=4
