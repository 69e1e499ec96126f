//! Decoder seam between the controller and the audio backend.

use crate::controller::Msg;
use crossbeam_channel::Sender;
use monologue_core::{Duration, Position, Result};
use std::fmt;
use url::Url;

/// Identifier of one playback session.
///
/// Ids increase monotonically over the life of a player and are never
/// reused, so an event tagged with a superseded id can be discarded safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Id handed to the first session of a fresh player.
    pub(crate) const FIRST: Self = Self(1);

    /// The id following this one.
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification from a decoder to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    /// The media is buffered far enough to start output.
    Ready,
    /// The stream reached its natural end.
    Completed,
    /// The decoder gave up; the message is surfaced to observers.
    Failed(String),
}

/// Channel a decoder reports through.
///
/// Every event sent carries the id of the session the sink was created for;
/// the controller discards events whose session is no longer current.
#[derive(Debug, Clone)]
pub struct DecoderEventSink {
    session: SessionId,
    tx: Sender<Msg>,
}

impl DecoderEventSink {
    pub(crate) const fn new(session: SessionId, tx: Sender<Msg>) -> Self {
        Self { session, tx }
    }

    /// Session this sink reports for.
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Post an event. Delivery is best-effort once the player is gone.
    pub fn send(&self, event: DecoderEvent) {
        let _ = self.tx.send(Msg::Decoder(self.session, event));
    }
}

/// One opened media stream under the controller's direction.
///
/// Implementations own the underlying resource; dropping the box releases
/// it. Readiness, completion, and failure are reported asynchronously
/// through the [`DecoderEventSink`] handed to [`DecoderFactory::open`].
pub trait Decoder: Send {
    /// Start or restart audible output.
    fn play(&mut self) -> Result<()>;

    /// Suspend output, retaining the current position.
    fn pause(&mut self) -> Result<()>;

    /// Stop output. Issued before release when the session was audible.
    fn stop(&mut self) -> Result<()>;

    /// Seek to an absolute target in milliseconds.
    ///
    /// The target may be negative or past the end of the stream;
    /// implementations clamp it to `[0, duration]` themselves.
    fn seek_to(&mut self, target_ms: i64) -> Result<()>;

    /// Current playback position.
    fn position(&self) -> Position;

    /// Total stream duration, once known.
    fn duration(&self) -> Option<Duration>;
}

/// Opens decoders on behalf of the controller.
pub trait DecoderFactory: Send + 'static {
    /// Acquire the media at `url` and begin the asynchronous prepare.
    ///
    /// A successful return only means the prepare is underway; the decoder
    /// reports [`DecoderEvent::Ready`] or [`DecoderEvent::Failed`] through
    /// `events` once it resolves.
    fn open(&mut self, url: &Url, events: DecoderEventSink) -> Result<Box<dyn Decoder>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_monotonic() {
        let first = SessionId::FIRST;
        let second = first.next();
        let third = second.next();
        assert!(first < second);
        assert!(second < third);
        assert_eq!(first.to_string(), "1");
        assert_eq!(third.to_string(), "3");
    }
}
