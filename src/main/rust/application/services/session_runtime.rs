use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session_coordinator::{Completion, ConnectionEvent, SessionCoordinator};
use crate::domain::entities::SessionSnapshot;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ConnectionListener, TransportEngine};
use crate::domain::value_objects::SessionState;

/// Requests marshalled onto the runtime task
pub enum Command {
    BindEngine(Box<dyn TransportEngine>),
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
    IsRunning(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Connection(ConnectionEvent),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable access to a running coordinator, for the UI and the engine
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    pub fn bind_engine(&self, engine: Box<dyn TransportEngine>) -> Result<()> {
        self.send(Command::BindEngine(engine))
    }

    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx))?;
        rx.await.map_err(|_| DomainError::CoordinatorUnavailable)?
    }

    pub async fn stop(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(tx))?;
        rx.await.map_err(|_| DomainError::CoordinatorUnavailable)?
    }

    /// False once the runtime is gone
    pub async fn is_running(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.send(Command::IsRunning(tx)).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| DomainError::CoordinatorUnavailable)
    }

    /// Stop the session, wait for its deregistration, release the engine and end the runtime
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await.map_err(|_| DomainError::CoordinatorUnavailable)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| DomainError::CoordinatorUnavailable)
    }

    fn forward(&self, event: ConnectionEvent) {
        if self.commands.send(Command::Connection(event)).is_err() {
            debug!("Dropping connection event, coordinator stopped");
        }
    }
}

impl ConnectionListener for CoordinatorHandle {
    fn on_connection_success(&self) {
        self.forward(ConnectionEvent::Succeeded);
    }

    fn on_connection_failed(&self, reason: String) {
        self.forward(ConnectionEvent::Failed(reason));
    }

    fn on_disconnect(&self) {
        self.forward(ConnectionEvent::Disconnected);
    }

    fn on_auth_error(&self) {
        self.forward(ConnectionEvent::AuthFailed);
    }

    fn on_auth_success(&self) {
        self.forward(ConnectionEvent::AuthSucceeded);
    }
}

/// Single task owning the coordinator; every session mutation happens here
pub struct SessionRuntime;

impl SessionRuntime {
    /// `shutdown_grace` bounds how long shutdown waits for an in-flight deregistration
    pub fn spawn(
        coordinator: SessionCoordinator,
        completions: mpsc::UnboundedReceiver<Completion>,
        shutdown_grace: Duration,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run(coordinator, rx, completions, shutdown_grace));
        (CoordinatorHandle { commands: tx }, task)
    }

    async fn run(
        mut coordinator: SessionCoordinator,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        shutdown_grace: Duration,
    ) {
        info!(mode = %coordinator.mode(), "Session runtime started");
        let mut shutdown = None;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Some(done) = Self::dispatch(&mut coordinator, command) {
                            shutdown = Some(done);
                            break;
                        }
                    }
                    None => break,
                },
                Some(completion) = completions.recv() => coordinator.apply(completion),
            }
        }

        if let Err(e) = coordinator.stop() {
            warn!(error = %e, "Failed to stop session during shutdown");
        }
        let drain = async {
            while coordinator.session().state() == SessionState::Stopping {
                match completions.recv().await {
                    Some(completion) => coordinator.apply(completion),
                    None => break,
                }
            }
        };
        if tokio::time::timeout(shutdown_grace, drain).await.is_err() {
            warn!(
                grace_secs = shutdown_grace.as_secs_f64(),
                "Deregistration still pending at shutdown, releasing engine anyway"
            );
        }
        coordinator.halt();

        info!("Session runtime stopped");
        if let Some(done) = shutdown {
            let _ = done.send(());
        }
    }

    /// Returns the shutdown acknowledgement when the command ends the runtime
    fn dispatch(
        coordinator: &mut SessionCoordinator,
        command: Command,
    ) -> Option<oneshot::Sender<()>> {
        match command {
            Command::BindEngine(engine) => coordinator.bind_engine(engine),
            Command::Start(reply) => {
                let _ = reply.send(coordinator.start());
            }
            Command::Stop(reply) => {
                let _ = reply.send(coordinator.stop());
            }
            Command::IsRunning(reply) => {
                let _ = reply.send(coordinator.is_running());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(coordinator.snapshot());
            }
            Command::Connection(event) => coordinator.handle_connection_event(event),
            Command::Shutdown(done) => return Some(done),
        }
        None
    }
}
