mod control_plane;
mod metrics_reporter;
mod status_sink;
mod transport_engine;

pub use control_plane::ControlPlane;
pub use metrics_reporter::MetricsReporter;
pub use status_sink::StatusSink;
pub use transport_engine::{ConnectionListener, TransportEngine};
