//! Core domain types for Monologue.

pub mod channel;
pub mod common;
pub mod episode;

pub use channel::{Channel, Image};
pub use common::{Duration, Position};
pub use episode::{Enclosure, Episode};
