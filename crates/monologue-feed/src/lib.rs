//! RSS feed parsing for Monologue.
//!
//! Maps the XML of a podcast feed onto [`monologue_core::Channel`] values.
//! Only structure is validated here: any sub-element of `<channel>` may be
//! absent, and field values are stored verbatim for consumers to interpret.
//! Fetching the feed bytes is the caller's job.

mod parser;

pub use parser::{parse_channel, parse_channel_bytes};
