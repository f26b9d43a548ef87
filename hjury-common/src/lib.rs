//! # hjury Common Library
//!
//! Shared code for hjury services:
//! - Common error type
//! - TOML / environment configuration
//! - Jury event types and broadcast bus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
