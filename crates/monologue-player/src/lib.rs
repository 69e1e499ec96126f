//! # monologue-player
//!
//! Playback control for the Monologue podcast client.
//!
//! [`Player`] drives one playback session at a time through a small state
//! machine running on its own worker thread. The audio backend lives behind
//! the [`Decoder`] and [`DecoderFactory`] traits, so the controller carries
//! no platform specifics and can be tested against a fake backend.

pub mod controller;
pub mod decoder;

pub use controller::{Command, Player, PlayerEvent, PlayerState, DEFAULT_SKIP_MS};
pub use decoder::{Decoder, DecoderEvent, DecoderEventSink, DecoderFactory, SessionId};
