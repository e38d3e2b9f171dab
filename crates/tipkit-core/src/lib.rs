//! Core types and trait definitions for the tipkit eligibility engine.
//!
//! This crate is deliberately free of database and UI dependencies. The
//! engine and every storage backend depend on it.

pub mod action;
pub mod error;
pub mod event;
pub mod store;

pub use error::{Error, Result};
