use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::domain::value_objects::SessionState;

/// State transition record
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Point-in-time copy of the session for callers outside the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub stream_id: Option<i64>,
    pub suppress_connection_errors: bool,
    pub epoch: u64,
    pub transitions: u64,
    pub last_transition: Option<StateTransition>,
}

/// The single stream session owned by the coordinator.
///
/// `stream_id` is only held while the control-plane has an active registration,
/// i.e. in `Streaming` or `Stopping`. Every leave of those states clears it.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: SessionState,
    stream_id: Option<i64>,
    suppress_connection_errors: bool,
    epoch: u64,
    last_transition: Option<StateTransition>,
    transition_count: u64,
    streaming_since: Option<Instant>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::Idle,
            stream_id: None,
            suppress_connection_errors: false,
            epoch: 0,
            last_transition: None,
            transition_count: 0,
            streaming_since: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stream_id(&self) -> Option<i64> {
        self.stream_id
    }

    pub fn suppresses_connection_errors(&self) -> bool {
        self.suppress_connection_errors
    }

    /// Attempt counter; async completions tagged with an older epoch are stale
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.state.is_streaming()
    }

    pub fn uptime(&self) -> Option<Duration> {
        self.streaming_since.map(|start| start.elapsed())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            state: self.state,
            stream_id: self.stream_id,
            suppress_connection_errors: self.suppress_connection_errors,
            epoch: self.epoch,
            transitions: self.transition_count,
            last_transition: self.last_transition.clone(),
        }
    }

    /// Open a new attempt and enter `Preparing`. Returns the attempt's epoch.
    pub fn begin_attempt(&mut self) -> u64 {
        self.epoch += 1;
        self.id = Uuid::new_v4().to_string();
        self.stream_id = None;
        self.suppress_connection_errors = false;
        self.streaming_since = None;
        self.record_transition(SessionState::Preparing, None);
        self.epoch
    }

    pub fn transition_to_registering(&mut self) {
        self.record_transition(SessionState::Registering, None);
    }

    pub fn transition_to_streaming(&mut self, stream_id: Option<i64>) {
        self.stream_id = stream_id;
        self.record_transition(SessionState::Streaming, None);
        self.streaming_since = Some(Instant::now());
    }

    /// Operator stop: connection errors from the engine are expected from here on
    pub fn transition_to_stopping(&mut self) {
        self.suppress_connection_errors = true;
        self.record_transition(SessionState::Stopping, Some("stopped by operator".to_string()));
    }

    pub fn transition_to_failed(&mut self, reason: Option<String>) {
        self.stream_id = None;
        self.streaming_since = None;
        self.record_transition(SessionState::Failed, reason);
    }

    /// Back to `Idle`, releasing everything the attempt held
    pub fn reset(&mut self, reason: Option<String>) {
        self.stream_id = None;
        self.suppress_connection_errors = false;
        self.streaming_since = None;
        if self.state != SessionState::Idle {
            self.record_transition(SessionState::Idle, reason);
        }
    }

    /// Reset and invalidate every completion issued for the current attempt
    pub fn abandon_attempt(&mut self, reason: Option<String>) {
        self.epoch += 1;
        self.reset(reason);
    }

    fn record_transition(&mut self, new_state: SessionState, reason: Option<String>) {
        self.last_transition = Some(StateTransition {
            from: self.state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        });
        self.transition_count += 1;
        self.state = new_state;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
