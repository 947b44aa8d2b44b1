use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Who owns the RTSP listening port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtspMode {
    /// The control-plane listens and the device announces into it
    Server,
    /// The device is reached by the control-plane
    Client,
}

impl RtspMode {
    /// Wire code used in the `mode` field
    pub fn code(&self) -> u8 {
        match self {
            Self::Server => 0,
            Self::Client => 1,
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server)
    }
}

impl FromStr for RtspMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" | "0" => Ok(Self::Server),
            "client" | "1" => Ok(Self::Client),
            _ => Err(DomainError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for RtspMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

impl Default for RtspMode {
    fn default() -> Self {
        Self::Server
    }
}
