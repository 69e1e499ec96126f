//! # monologue-core
//!
//! Core types and error handling for the Monologue podcast client.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
