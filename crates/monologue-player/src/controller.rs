//! Playback controller running the session state machine.

use crate::decoder::{Decoder, DecoderEvent, DecoderEventSink, DecoderFactory, SessionId};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use monologue_core::{Duration, Episode, Error, Position, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Transport skip applied by [`Player::forward`] and [`Player::rewind`], in
/// milliseconds.
pub const DEFAULT_SKIP_MS: i64 = 30_000;

/// Observable state of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No session exists.
    #[default]
    Idle,
    /// A session exists and its decoder is loading the media.
    Preparing,
    /// The session is audible.
    Playing,
    /// Output is suspended; the session retains its position.
    Paused,
    /// The session is being torn down; the resting state is `Idle`.
    Stopped,
}

/// Commands accepted by the playback controller.
#[derive(Debug, Clone)]
pub enum Command {
    /// Tear down any current session and start preparing this episode.
    Play(Episode),
    /// Suspend output, retaining the position.
    Pause,
    /// Resume output from the retained position.
    Resume,
    /// Tear down the current session.
    Stop,
    /// Move the playback position by a signed delta in milliseconds.
    Seek { delta_ms: i64 },
    /// Tear down and terminate the worker.
    Shutdown,
}

/// Events emitted by the playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Controller state changed.
    StateChanged(PlayerState),
    /// Playback position moved.
    PositionChanged(Position),
    /// Stream duration became known.
    DurationChanged(Duration),
    /// The stream reached its natural end.
    PlaybackFinished,
    /// A playback error; any session involved was torn down.
    Error(String),
}

/// Internal worker messages. Commands and decoder events share one channel,
/// which serializes them into a single total order.
#[derive(Debug)]
pub(crate) enum Msg {
    Command(Command),
    Decoder(SessionId, DecoderEvent),
}

/// Playback controller for podcast episodes.
///
/// Owns a worker thread that processes commands and decoder events one at a
/// time; the handle exposes snapshots of the observable state plus an event
/// stream. Dropping the handle shuts the worker down.
pub struct Player {
    /// Current controller state.
    state: Arc<RwLock<PlayerState>>,
    /// Position of the current session.
    position: Arc<RwLock<Position>>,
    /// Duration of the current stream, once known.
    duration: Arc<RwLock<Option<Duration>>>,
    /// Episode of the current session.
    current_episode: Arc<RwLock<Option<Episode>>>,
    /// Command sender.
    command_tx: Sender<Msg>,
    /// Event receiver.
    event_rx: Receiver<PlayerEvent>,
}

impl Player {
    /// Spawn the worker thread and return the controlling handle.
    pub fn new(factory: impl DecoderFactory) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let state = Arc::new(RwLock::new(PlayerState::Idle));
        let position = Arc::new(RwLock::new(Position::ZERO));
        let duration = Arc::new(RwLock::new(None));
        let current_episode = Arc::new(RwLock::new(None));

        let worker = Worker::new(
            command_rx,
            command_tx.clone(),
            event_tx,
            state.clone(),
            position.clone(),
            duration.clone(),
            current_episode.clone(),
            Box::new(factory),
        );

        std::thread::Builder::new()
            .name("monologue-player".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            state,
            position,
            duration,
            current_episode,
            command_tx,
            event_rx,
        })
    }

    /// Current controller state.
    pub fn state(&self) -> PlayerState {
        *self.state.read()
    }

    /// Position of the current session.
    pub fn position(&self) -> Position {
        *self.position.read()
    }

    /// Duration of the current stream, once the decoder has reported it.
    pub fn duration(&self) -> Option<Duration> {
        *self.duration.read()
    }

    /// Episode the current session was started with, if any.
    pub fn current_episode(&self) -> Option<Episode> {
        self.current_episode.read().clone()
    }

    /// Send a command to the worker.
    pub fn send_command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(Msg::Command(command))
            .map_err(|_| Error::PlayerClosed)
    }

    /// Start playing an episode, replacing any current session.
    pub fn play(&self, episode: Episode) -> Result<()> {
        self.send_command(Command::Play(episode))
    }

    /// Pause the current session.
    pub fn pause(&self) -> Result<()> {
        self.send_command(Command::Pause)
    }

    /// Resume the current session.
    pub fn resume(&self) -> Result<()> {
        self.send_command(Command::Resume)
    }

    /// Stop and tear down the current session.
    pub fn stop(&self) -> Result<()> {
        self.send_command(Command::Stop)
    }

    /// Move the playback position by a signed number of milliseconds.
    pub fn seek(&self, delta_ms: i64) -> Result<()> {
        self.send_command(Command::Seek { delta_ms })
    }

    /// Skip forward by the default transport step.
    pub fn forward(&self) -> Result<()> {
        self.seek(DEFAULT_SKIP_MS)
    }

    /// Skip back by the default transport step.
    pub fn rewind(&self) -> Result<()> {
        self.seek(-DEFAULT_SKIP_MS)
    }

    /// Try to receive an event without blocking.
    pub fn try_recv_event(&self) -> Option<PlayerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, blocking until one is available.
    pub fn recv_event(&self) -> Option<PlayerEvent> {
        self.event_rx.recv().ok()
    }

    /// Receive an event, blocking up to `timeout`.
    pub fn recv_event_timeout(&self, timeout: StdDuration) -> Option<PlayerEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Tear down any session and terminate the worker.
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(Command::Shutdown)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // Worker exits once the shutdown command is processed.
        let _ = self.send_command(Command::Shutdown);
    }
}

/// Live playback session owned by the worker.
struct Session {
    id: SessionId,
    episode: Episode,
    /// Decoder handle; dropping it releases the underlying resource.
    decoder: Box<dyn Decoder>,
    /// Set once output has started; stop is only issued for audible sessions.
    started: bool,
}

/// Internal worker owning all mutable session state.
struct Worker {
    msg_rx: Receiver<Msg>,
    /// Sender handed to decoder event sinks.
    msg_tx: Sender<Msg>,
    event_tx: Sender<PlayerEvent>,
    state: Arc<RwLock<PlayerState>>,
    position: Arc<RwLock<Position>>,
    duration: Arc<RwLock<Option<Duration>>>,
    current_episode: Arc<RwLock<Option<Episode>>>,
    factory: Box<dyn DecoderFactory>,
    /// Current session, if any.
    session: Option<Session>,
    /// Id the next session will take.
    next_session: SessionId,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        msg_rx: Receiver<Msg>,
        msg_tx: Sender<Msg>,
        event_tx: Sender<PlayerEvent>,
        state: Arc<RwLock<PlayerState>>,
        position: Arc<RwLock<Position>>,
        duration: Arc<RwLock<Option<Duration>>>,
        current_episode: Arc<RwLock<Option<Episode>>>,
        factory: Box<dyn DecoderFactory>,
    ) -> Self {
        Self {
            msg_rx,
            msg_tx,
            event_tx,
            state,
            position,
            duration,
            current_episode,
            factory,
            session: None,
            next_session: SessionId::FIRST,
        }
    }

    fn run(mut self) {
        info!("Player worker started");

        let mut last_position_update = Instant::now();
        let position_update_interval = StdDuration::from_millis(100);

        loop {
            let msg = match self.msg_rx.recv_timeout(StdDuration::from_millis(50)) {
                Ok(msg) => Some(msg),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Command channel closed, shutting down");
                    break;
                }
            };

            if let Some(msg) = msg {
                if matches!(msg, Msg::Command(Command::Shutdown)) {
                    info!("Player shutting down");
                    break;
                }
                self.handle_msg(msg);
            }

            // Refresh the observable position while audible
            if *self.state.read() == PlayerState::Playing
                && last_position_update.elapsed() >= position_update_interval
            {
                self.refresh_position();
                last_position_update = Instant::now();
            }
        }

        self.teardown();
    }

    fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Command(command) => self.handle_command(command),
            Msg::Decoder(id, event) => self.handle_decoder_event(id, event),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play(episode) => self.start_session(episode),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Stop => self.stop(),
            Command::Seek { delta_ms } => self.seek(delta_ms),
            Command::Shutdown => {
                // Handled in the main loop
            }
        }
    }

    /// Decoder events are only honored for the current session; anything
    /// tagged with a superseded id is from a torn-down session and must not
    /// touch current state.
    fn handle_decoder_event(&mut self, id: SessionId, event: DecoderEvent) {
        if self.session.as_ref().map(|s| s.id) != Some(id) {
            debug!("Discarding stale decoder event {event:?} for session {id}");
            return;
        }

        match event {
            DecoderEvent::Ready => self.on_ready(),
            DecoderEvent::Completed => self.on_completed(),
            DecoderEvent::Failed(message) => {
                self.fail_session(format!("Decoder failed: {message}"));
            }
        }
    }

    fn start_session(&mut self, episode: Episode) {
        // A new play always replaces whatever session exists.
        self.teardown();

        let url = match media_url(&episode) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot play {}: {e}", episode.display_title());
                let _ = self.event_tx.send(PlayerEvent::Error(e.to_string()));
                return;
            }
        };

        let id = self.next_session;
        self.next_session = id.next();
        let sink = DecoderEventSink::new(id, self.msg_tx.clone());

        match self.factory.open(&url, sink) {
            Ok(decoder) => {
                debug!("Session {id} preparing {}", episode.display_title());
                *self.current_episode.write() = Some(episode.clone());
                self.session = Some(Session {
                    id,
                    episode,
                    decoder,
                    started: false,
                });
                self.set_state(PlayerState::Preparing);
            }
            Err(e) => {
                error!("Failed to open decoder for session {id}: {e}");
                let _ = self.event_tx.send(PlayerEvent::Error(e.to_string()));
                // No session was created; the player stays Idle.
            }
        }
    }

    fn on_ready(&mut self) {
        if *self.state.read() != PlayerState::Preparing {
            debug!("Ignoring duplicate ready for current session");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(duration) = session.decoder.duration() {
            *self.duration.write() = Some(duration);
            let _ = self.event_tx.send(PlayerEvent::DurationChanged(duration));
        }

        if let Err(e) = session.decoder.play() {
            self.fail_session(format!("Failed to start playback: {e}"));
            return;
        }
        session.started = true;
        self.set_state(PlayerState::Playing);
    }

    fn on_completed(&mut self) {
        info!("Playback finished");
        let _ = self.event_tx.send(PlayerEvent::PlaybackFinished);
        self.teardown();
    }

    fn pause(&mut self) {
        let state = *self.state.read();
        if state != PlayerState::Playing {
            debug!("Ignoring pause in state {state:?}");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = session.decoder.pause() {
            self.fail_session(format!("Pause failed: {e}"));
            return;
        }
        self.set_state(PlayerState::Paused);
    }

    fn resume(&mut self) {
        let state = *self.state.read();
        if state != PlayerState::Paused {
            debug!("Ignoring resume in state {state:?}");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = session.decoder.play() {
            self.fail_session(format!("Resume failed: {e}"));
            return;
        }
        self.set_state(PlayerState::Playing);
    }

    fn stop(&mut self) {
        if self.session.is_none() {
            debug!("Ignoring stop without a session");
            return;
        }
        self.teardown();
    }

    fn seek(&mut self, delta_ms: i64) {
        let state = *self.state.read();
        if !matches!(state, PlayerState::Playing | PlayerState::Paused) {
            debug!("Ignoring seek in state {state:?}");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let target = (session.decoder.position().as_millis() as i64).saturating_add(delta_ms);
        debug!("Seeking session {} by {delta_ms} ms to {target} ms", session.id);
        if let Err(e) = session.decoder.seek_to(target) {
            self.fail_session(format!("Seek failed: {e}"));
            return;
        }
        self.refresh_position();
    }

    /// Uniform handling of a failed decoder operation: surface the error,
    /// then tear the session down.
    fn fail_session(&mut self, message: String) {
        error!("{message}");
        let _ = self.event_tx.send(PlayerEvent::Error(message));
        self.teardown();
    }

    /// Release the current session, if any. Every exit path out of a session
    /// goes through here; the resting state afterwards is `Idle`.
    fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        debug!(
            "Tearing down session {} ({})",
            session.id,
            session.episode.display_title()
        );
        self.set_state(PlayerState::Stopped);

        if session.started {
            if let Err(e) = session.decoder.stop() {
                warn!("Failed to stop decoder: {e}");
            }
        }
        // Dropping the session releases the decoder handle.
        drop(session);

        *self.position.write() = Position::ZERO;
        *self.duration.write() = None;
        *self.current_episode.write() = None;
        let _ = self
            .event_tx
            .send(PlayerEvent::PositionChanged(Position::ZERO));

        self.set_state(PlayerState::Idle);
    }

    fn refresh_position(&self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let position = session.decoder.position();
        let old = {
            let mut current = self.position.write();
            let old = *current;
            *current = position;
            old
        };

        if old != position {
            let _ = self.event_tx.send(PlayerEvent::PositionChanged(position));
        }
    }

    fn set_state(&self, new_state: PlayerState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!("State changed: {:?} -> {:?}", old_state, new_state);
            let _ = self.event_tx.send(PlayerEvent::StateChanged(new_state));
        }
    }
}

/// Validate and parse the episode's media URL at play time.
fn media_url(episode: &Episode) -> Result<Url> {
    let raw = episode.media_url().ok_or(Error::NoMediaUrl)?;
    Url::parse(raw).map_err(|e| Error::InvalidMediaUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
