pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{CoordinatorHandle, SessionCoordinator, SessionRuntime};
pub use config::Config;
pub use domain::entities::{Session, SessionSnapshot};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{ConnectionListener, ControlPlane, MetricsReporter, StatusSink, TransportEngine};
pub use domain::value_objects::{
    ControlPlaneConfig, EncodingType, MediaConfig, RtspMode, SessionState, StreamRegistration,
};
#[cfg(feature = "gstreamer")]
pub use infrastructure::gstreamer::GStreamerEngine;
pub use infrastructure::console::ConsoleStatusSink;
pub use infrastructure::http::HttpControlPlane;
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
pub use infrastructure::network::resolve_device_address;
