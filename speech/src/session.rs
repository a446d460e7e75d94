//! Playback session identity and the single active audio source.
//!
//! Every playback request begins a new session. Beginning a session stops the
//! sounding source and cancels the previous session, whose producer and
//! consumer then exit without touching shared state. All check-then-act steps
//! go through [`SessionRegistry::with_current`], which runs under one lock.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::sink::PlaybackHandle;

/// Monotonically increasing session identifier.
pub type SessionId = u64;

/// Which message is loading or playing, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indicators {
    /// Message whose audio is currently sounding.
    pub now_playing: Option<String>,
    /// Message whose first chunk is still being synthesized.
    pub loading: Option<String>,
}

/// One playback attempt.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    message_id: Arc<str>,
    cancel: CancellationToken,
}

impl Session {
    /// Returns the session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the message being played.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Returns the token cancelled when this session is superseded.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Outcome of a playback request.
#[derive(Debug)]
pub enum Begin {
    /// A new session was started.
    Started(Session),
    /// The message was already playing, so playback was stopped instead.
    Stopped,
}

struct RegistryState {
    current: SessionId,
    cancel: CancellationToken,
    active: Option<Arc<dyn PlaybackHandle>>,
}

/// Owns the current session id and the single active audio source.
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    indicators: watch::Sender<Indicators>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates a registry with no session.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                current: 0,
                cancel: CancellationToken::new(),
                active: None,
            }),
            indicators: watch::Sender::new(Indicators::default()),
        }
    }

    /// Returns the id of the current session, 0 before the first one.
    pub fn current_id(&self) -> SessionId {
        self.state.lock().current
    }

    /// Returns true if `id` is the current session.
    pub fn is_current(&self, id: SessionId) -> bool {
        self.state.lock().current == id
    }

    /// Returns the current indicators.
    pub fn indicators(&self) -> Indicators {
        self.indicators.borrow().clone()
    }

    /// Subscribes to indicator changes.
    pub fn subscribe(&self) -> watch::Receiver<Indicators> {
        self.indicators.subscribe()
    }

    /// Returns true if an audio source is registered as sounding.
    pub fn has_active_audio(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Starts a new session for `message_id`, superseding the current one.
    pub fn begin(&self, message_id: &str) -> Session {
        let mut state = self.state.lock();
        self.begin_locked(&mut state, message_id)
    }

    /// Starts a new session for `message_id`, or stops playback if that
    /// message is the one currently playing.
    pub fn request(&self, message_id: &str) -> Begin {
        let mut state = self.state.lock();
        let playing = self.indicators.borrow().now_playing.as_deref() == Some(message_id);
        if playing {
            self.supersede(&mut state);
            self.set_indicators(Indicators::default());
            debug!(session = state.current, message = %message_id, "session: toggled off");
            return Begin::Stopped;
        }
        Begin::Started(self.begin_locked(&mut state, message_id))
    }

    /// Stops the sounding source and invalidates the current session.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        self.supersede(&mut state);
        self.set_indicators(Indicators::default());
    }

    /// Runs `f` only if `session` is still current, while holding the lock.
    ///
    /// Returns `None` if the session was superseded.
    pub fn with_current<R>(&self, session: &Session, f: impl FnOnce(&mut SessionScope<'_>) -> R) -> Option<R> {
        let mut state = self.state.lock();
        if state.current != session.id {
            return None;
        }
        let mut scope = SessionScope {
            state: &mut *state,
            indicators: &self.indicators,
            message_id: &*session.message_id,
        };
        Some(f(&mut scope))
    }

    fn begin_locked(&self, state: &mut RegistryState, message_id: &str) -> Session {
        self.supersede(state);
        self.set_indicators(Indicators::default());
        debug!(session = state.current, message = %message_id, "session: begin");
        Session {
            id: state.current,
            message_id: Arc::from(message_id),
            cancel: state.cancel.clone(),
        }
    }

    fn supersede(&self, state: &mut RegistryState) {
        if let Some(handle) = state.active.take() {
            handle.stop();
        }
        state.cancel.cancel();
        state.current += 1;
        state.cancel = CancellationToken::new();
    }

    fn set_indicators(&self, value: Indicators) {
        self.indicators.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}

/// Mutable access to shared playback state on behalf of the current session.
pub struct SessionScope<'a> {
    state: &'a mut RegistryState,
    indicators: &'a watch::Sender<Indicators>,
    message_id: &'a str,
}

impl SessionScope<'_> {
    /// Marks the session's message as loading, or clears the loading mark.
    pub fn set_loading(&mut self, loading: bool) {
        let value = loading.then(|| self.message_id.to_string());
        self.indicators.send_if_modified(|ind| {
            if ind.loading == value {
                return false;
            }
            ind.loading = value;
            true
        });
    }

    /// Marks the session's message as playing, or clears the playing mark.
    pub fn set_playing(&mut self, playing: bool) {
        let value = playing.then(|| self.message_id.to_string());
        self.indicators.send_if_modified(|ind| {
            if ind.now_playing == value {
                return false;
            }
            ind.now_playing = value;
            true
        });
    }

    /// Clears both indicators.
    pub fn clear_indicators(&mut self) {
        self.set_loading(false);
        self.set_playing(false);
    }

    /// Registers `handle` as the sounding source, stopping any previous one.
    pub fn set_active(&mut self, handle: Arc<dyn PlaybackHandle>) {
        if let Some(previous) = self.state.active.replace(handle) {
            previous.stop();
        }
    }

    /// Forgets the sounding source without stopping it.
    pub fn clear_active(&mut self) {
        self.state.active = None;
    }
}
