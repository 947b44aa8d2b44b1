use std::fmt;

/// Status line shown by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusText {
    Idle,
    Running,
    Stopped,
    ServerError,
    NetworkError,
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
            Self::ServerError => write!(f, "Server error"),
            Self::NetworkError => write!(f, "Network error"),
        }
    }
}

/// Label of the single start/stop action control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionLabel {
    Start,
    Stop,
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

/// Transient message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CaptureUnsupported,
    StreamAccepted,
    RegistrationRejected(String),
    ControlPlaneUnavailable,
    ConnectionEstablished,
    ConnectionError(String),
    Disconnected,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::CaptureUnsupported
                | Self::RegistrationRejected(_)
                | Self::ControlPlaneUnavailable
                | Self::ConnectionError(_)
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaptureUnsupported => {
                write!(f, "Error preparing stream, this device can't do it")
            }
            Self::StreamAccepted => write!(f, "Server conversion started"),
            Self::RegistrationRejected(message) => {
                write!(f, "Server conversion failed: {}", message)
            }
            Self::ControlPlaneUnavailable => write!(f, "Control-plane server is unavailable"),
            Self::ConnectionEstablished => write!(f, "RTSP connection established"),
            Self::ConnectionError(reason) => write!(f, "RTSP connection error: {}", reason),
            Self::Disconnected => write!(f, "RTSP disconnected"),
        }
    }
}
