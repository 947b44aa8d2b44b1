use thiserror::Error;

use crate::domain::value_objects::SessionState;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Capture context not bound: call bind_engine() before start()")]
    CaptureContextNotBound,

    #[error("Device cannot satisfy the requested capture parameters")]
    CaptureUnsupported,

    #[error("Control-plane rejected registration (status {status}): {message}")]
    RegistrationRejected { status: i64, message: String },

    #[error("Control-plane unavailable: {0}")]
    ControlPlaneUnavailable(String),

    #[error("Malformed control-plane reply: {0}")]
    MalformedReply(String),

    #[error("Transport failed: {0}")]
    TransportFailed(String),

    #[error("Deregistration of stream {stream_id} failed: {reason}")]
    DeregistrationFailed { stream_id: i64, reason: String },

    #[error("Session busy in state {0}")]
    SessionBusy(SessionState),

    #[error("Session coordinator is no longer running")]
    CoordinatorUnavailable,

    #[error("Invalid port: port cannot be zero")]
    InvalidPort,

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Invalid media parameter {name}: {value}")]
    InvalidMediaParameter { name: &'static str, value: u32 },

    #[error("Invalid rotation: {0} (expected 0, 90, 180 or 270)")]
    InvalidRotation(u16),

    #[error("Unknown encoding type: {0}")]
    UnknownEncodingType(u8),

    #[error("Unknown RTSP mode: {0}")]
    UnknownMode(String),

    #[error("Device address unavailable: {0}")]
    DeviceAddressUnavailable(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
