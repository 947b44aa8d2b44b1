use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::entities::{Session, SessionSnapshot};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ControlPlane, MetricsReporter, StatusSink, TransportEngine};
use crate::domain::value_objects::{
    ActionLabel, MediaConfig, Notice, RtspMode, SessionState, StatusText, StreamRegistration,
};

/// Result of an async control-plane call, tagged with the attempt that issued it
#[derive(Debug)]
pub enum Completion {
    Registered {
        epoch: u64,
        result: Result<StreamRegistration>,
    },
    Deregistered {
        epoch: u64,
        stream_id: i64,
        result: Result<()>,
    },
}

/// Connection event reported by the transport engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Succeeded,
    Failed(String),
    Disconnected,
    AuthFailed,
    AuthSucceeded,
}

/// Sequences capture preparation, control-plane registration and transport
/// start/stop for the single session of the process.
///
/// All methods take `&mut self` and never wait on the network: register and
/// deregister calls are spawned on the tokio runtime and come back as
/// [`Completion`]s that the owner feeds into [`SessionCoordinator::apply`].
pub struct SessionCoordinator {
    session: Session,
    media: MediaConfig,
    mode: RtspMode,
    engine: Option<Box<dyn TransportEngine>>,
    control_plane: Arc<dyn ControlPlane>,
    status: Arc<dyn StatusSink>,
    metrics: Arc<dyn MetricsReporter>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl SessionCoordinator {
    pub fn new(
        media: MediaConfig,
        mode: RtspMode,
        control_plane: Arc<dyn ControlPlane>,
        status: Arc<dyn StatusSink>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let coordinator = Self {
            session: Session::new(),
            media,
            mode,
            engine: None,
            control_plane,
            status,
            metrics,
            completions,
        };
        coordinator.status.show_status(StatusText::Idle);
        coordinator.status.show_action(ActionLabel::Start);
        (coordinator, receiver)
    }

    /// Bind the capture context. Must happen before the first `start()`.
    pub fn bind_engine(&mut self, engine: Box<dyn TransportEngine>) {
        if self.engine.is_some() {
            info!("Replacing bound transport engine");
            self.halt_engine();
        }
        self.engine = Some(engine);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn mode(&self) -> RtspMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// Begin a session, or stop the active one (toggle semantics)
    pub fn start(&mut self) -> Result<()> {
        let transporting = match self.engine.as_ref() {
            Some(engine) => engine.is_transporting(),
            None => return Err(DomainError::CaptureContextNotBound),
        };

        let state = self.session.state();
        if state == SessionState::Stopping {
            return Err(DomainError::SessionBusy(state));
        }
        if transporting || matches!(state, SessionState::Streaming | SessionState::Registering) {
            info!(state = %state, transporting, "Session already active, start toggles to stop");
            return self.stop();
        }

        let epoch = self.session.begin_attempt();
        self.report_state();
        info!(session_id = %self.session.id(), epoch, "Preparing capture");

        if !self.prepare_capture() {
            warn!(session_id = %self.session.id(), "Device cannot satisfy capture parameters");
            self.release_capture();
            self.session
                .reset(Some("capture preparation failed".to_string()));
            self.report_state();
            self.status.notify(&Notice::CaptureUnsupported);
            self.status.show_action(ActionLabel::Start);
            return Err(DomainError::CaptureUnsupported);
        }

        self.session.transition_to_registering();
        self.report_state();
        self.status.show_status(StatusText::Running);
        self.status.show_action(ActionLabel::Stop);
        self.spawn_registration(epoch);

        Ok(())
    }

    /// Stop the active session. No-op on a resting session.
    pub fn stop(&mut self) -> Result<()> {
        match self.session.state() {
            SessionState::Idle | SessionState::Failed => {
                if self.engine_transporting() {
                    info!("Engine still transporting without a session, halting it");
                    self.halt_engine();
                } else {
                    debug!("stop() on idle session ignored");
                }
            }
            SessionState::Stopping => {
                debug!("Deregistration already in flight");
            }
            SessionState::Preparing | SessionState::Registering => {
                info!(session_id = %self.session.id(), "Abandoning registration in flight");
                self.release_capture();
                self.session
                    .abandon_attempt(Some("stopped before registration completed".to_string()));
                self.report_state();
                self.show_stopped();
            }
            SessionState::Streaming => match self.session.stream_id() {
                Some(stream_id) if self.mode.is_server() && stream_id > 0 => {
                    info!(session_id = %self.session.id(), stream_id, "Stopping stream, deregistering");
                    self.session.transition_to_stopping();
                    self.report_state();
                    self.show_stopped();
                    self.spawn_deregistration(self.session.epoch(), stream_id);
                }
                _ => {
                    info!(session_id = %self.session.id(), "Stopping stream locally");
                    self.halt_engine();
                    self.reset_session("stopped by operator");
                    self.show_stopped();
                }
            },
        }

        Ok(())
    }

    /// Feed back the result of a spawned control-plane call
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Registered { epoch, result } => self.complete_registration(epoch, result),
            Completion::Deregistered {
                epoch,
                stream_id,
                result,
            } => self.complete_deregistration(epoch, stream_id, result),
        }
    }

    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Succeeded => self.on_connection_success(),
            ConnectionEvent::Failed(reason) => self.on_connection_failed(reason),
            ConnectionEvent::Disconnected => self.on_disconnect(),
            ConnectionEvent::AuthFailed => self.on_auth_error(),
            ConnectionEvent::AuthSucceeded => self.on_auth_success(),
        }
    }

    pub fn on_connection_success(&mut self) {
        info!(session_id = %self.session.id(), "RTSP connection established");
        self.status.notify(&Notice::ConnectionEstablished);
    }

    pub fn on_connection_failed(&mut self, reason: String) {
        let state = self.session.state();
        self.halt_engine();

        if state.is_resting() {
            debug!(reason = %reason, state = %state, "Connection failure on a resting session");
            self.status.show_action(ActionLabel::Start);
            return;
        }

        if self.session.suppresses_connection_errors() {
            info!(session_id = %self.session.id(), reason = %reason, "Connection closed during operator stop");
            self.reset_session("connection closed during stop");
            self.status.show_status(StatusText::Stopped);
        } else {
            warn!(session_id = %self.session.id(), reason = %reason, "RTSP connection failed");
            self.metrics.report_transport_failure();
            self.report_uptime();
            self.session.transition_to_failed(Some(reason.clone()));
            self.report_state();
            self.status.show_status(StatusText::ServerError);
            self.status.notify(&Notice::ConnectionError(reason));
        }
        self.status.show_action(ActionLabel::Start);
    }

    pub fn on_disconnect(&mut self) {
        let state = self.session.state();
        info!(session_id = %self.session.id(), state = %state, "RTSP disconnected");
        self.release_capture();

        if !state.is_resting() {
            let status = if self.session.suppresses_connection_errors() {
                StatusText::Stopped
            } else {
                StatusText::ServerError
            };
            self.reset_session("disconnected");
            self.status.show_status(status);
        }
        self.status.show_action(ActionLabel::Start);
        self.status.notify(&Notice::Disconnected);
    }

    pub fn on_auth_error(&mut self) {
        warn!(session_id = %self.session.id(), "RTSP authentication rejected");
        if !self.session.state().is_resting() {
            self.reset_session("authentication rejected");
        }
    }

    pub fn on_auth_success(&mut self) {
        debug!(session_id = %self.session.id(), "RTSP authentication accepted");
    }

    /// Stop everything the engine holds, regardless of session state
    pub fn halt(&mut self) {
        self.halt_engine();
    }

    fn complete_registration(&mut self, epoch: u64, result: Result<StreamRegistration>) {
        if epoch != self.session.epoch() || self.session.state() != SessionState::Registering {
            debug!(
                epoch,
                current_epoch = self.session.epoch(),
                state = %self.session.state(),
                "Ignoring stale registration completion"
            );
            return;
        }

        match result {
            Ok(registration) => {
                let target = registration.rtsp_target();
                info!(
                    session_id = %self.session.id(),
                    stream_id = registration.stream_id(),
                    target = %target,
                    "Control-plane accepted stream, starting transport"
                );
                self.metrics.report_registration(true);

                let stream_id = self.mode.is_server().then_some(registration.stream_id());
                self.session.transition_to_streaming(stream_id);
                self.report_state();

                let started = match self.engine.as_mut() {
                    Some(engine) => engine.start_transport(&target),
                    None => Err(DomainError::CaptureContextNotBound),
                };
                match started {
                    Ok(()) => self.status.notify(&Notice::StreamAccepted),
                    Err(e) => self.on_connection_failed(e.to_string()),
                }
            }
            Err(err) => {
                warn!(session_id = %self.session.id(), error = %err, "Registration failed");
                self.metrics.report_registration(false);
                self.release_capture();
                self.session.transition_to_failed(Some(err.to_string()));
                self.report_state();

                let (status, notice) = match err {
                    DomainError::RegistrationRejected { message, .. } => {
                        (StatusText::ServerError, Notice::RegistrationRejected(message))
                    }
                    _ => (StatusText::NetworkError, Notice::ControlPlaneUnavailable),
                };
                self.status.show_status(status);
                self.status.show_action(ActionLabel::Start);
                self.status.notify(&notice);
            }
        }
    }

    fn complete_deregistration(&mut self, epoch: u64, stream_id: i64, result: Result<()>) {
        self.metrics.report_deregistration(result.is_ok());

        if epoch != self.session.epoch() {
            debug!(
                epoch,
                current_epoch = self.session.epoch(),
                stream_id,
                ok = result.is_ok(),
                "Deregistration belongs to a superseded attempt"
            );
            return;
        }

        match &result {
            Ok(()) => info!(stream_id, "Control-plane released stream"),
            Err(err) => {
                warn!(stream_id, error = %err, "Deregistration failed, releasing local state anyway");
                self.status.notify(&Notice::ControlPlaneUnavailable);
            }
        }

        if self.engine_transporting() {
            self.halt_engine();
        }
        self.reset_session("deregistration completed");
    }

    fn prepare_capture(&mut self) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        engine.prepare_audio(self.media.audio()) && engine.prepare_video(self.media.video())
    }

    fn spawn_registration(&self, epoch: u64) {
        let control_plane = Arc::clone(&self.control_plane);
        let completions = self.completions.clone();
        let media = self.media.clone();

        tokio::spawn(async move {
            let result = control_plane.register(&media).await;
            if completions
                .send(Completion::Registered { epoch, result })
                .is_err()
            {
                debug!(epoch, "Registration completed after coordinator shut down");
            }
        });
    }

    fn spawn_deregistration(&self, epoch: u64, stream_id: i64) {
        let control_plane = Arc::clone(&self.control_plane);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let result = control_plane.deregister(stream_id).await;
            if completions
                .send(Completion::Deregistered {
                    epoch,
                    stream_id,
                    result,
                })
                .is_err()
            {
                debug!(stream_id, "Deregistration completed after coordinator shut down");
            }
        });
    }

    fn engine_transporting(&self) -> bool {
        self.engine
            .as_ref()
            .map(|engine| engine.is_transporting())
            .unwrap_or(false)
    }

    fn halt_engine(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.is_transporting() {
            if let Err(e) = engine.stop_transport() {
                warn!(error = %e, "Failed to stop transport");
            }
        }
        if let Err(e) = engine.stop_recording() {
            warn!(error = %e, "Failed to stop recording");
        }
    }

    fn release_capture(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.stop_recording() {
                warn!(error = %e, "Failed to release capture");
            }
        }
    }

    fn reset_session(&mut self, reason: &str) {
        self.report_uptime();
        self.session.reset(Some(reason.to_string()));
        self.report_state();
    }

    fn show_stopped(&self) {
        self.status.show_status(StatusText::Stopped);
        self.status.show_action(ActionLabel::Start);
    }

    fn report_state(&self) {
        self.metrics.report_state_change(&self.session.state());
    }

    fn report_uptime(&self) {
        if let Some(uptime) = self.session.uptime() {
            self.metrics.report_uptime(uptime.as_secs_f64());
        }
    }
}
