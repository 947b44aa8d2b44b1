use std::fmt;

/// Stream session lifecycle states (pure domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session attempt in progress
    Idle,
    /// Capture is being prepared by the transport engine
    Preparing,
    /// Waiting for the control-plane to allocate an endpoint
    Registering,
    /// Transport started at the allocated endpoint
    Streaming,
    /// Operator stop issued, deregistration in flight
    Stopping,
    /// Last attempt ended in an error
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Preparing => write!(f, "PREPARING"),
            Self::Registering => write!(f, "REGISTERING"),
            Self::Streaming => write!(f, "STREAMING"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl SessionState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Preparing => 1.0,
            Self::Registering => 2.0,
            Self::Streaming => 3.0,
            Self::Stopping => 4.0,
            Self::Failed => 5.0,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// No attempt is active; `start()` may begin a new one
    pub fn is_resting(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
