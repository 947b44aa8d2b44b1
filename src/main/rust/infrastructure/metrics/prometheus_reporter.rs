use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::SessionState;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Session state (0=Idle, 1=Preparing, 2=Registering, 3=Streaming, 4=Stopping, 5=Failed)
    pub static ref SESSION_STATE: Gauge = Gauge::new(
        "stream_session_state",
        "Current stream session state"
    ).expect("metric can be created");

    pub static ref REGISTRATIONS: IntCounter = IntCounter::new(
        "control_plane_registrations_total",
        "Streams accepted by the control-plane"
    ).expect("metric can be created");

    pub static ref REGISTRATION_FAILURES: IntCounter = IntCounter::new(
        "control_plane_registration_failures_total",
        "Registrations rejected by or undeliverable to the control-plane"
    ).expect("metric can be created");

    pub static ref TRANSPORT_FAILURES: IntCounter = IntCounter::new(
        "rtsp_transport_failures_total",
        "RTSP connection failures reported by the transport engine"
    ).expect("metric can be created");

    pub static ref DEREGISTRATION_FAILURES: IntCounter = IntCounter::new(
        "control_plane_deregistration_failures_total",
        "Kill requests that failed (local state released anyway)"
    ).expect("metric can be created");

    pub static ref STREAM_UPTIME_SECONDS: Gauge = Gauge::new(
        "stream_uptime_seconds",
        "Duration of the last finished streaming session"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(SESSION_STATE.clone()))?;
        REGISTRY.register(Box::new(REGISTRATIONS.clone()))?;
        REGISTRY.register(Box::new(REGISTRATION_FAILURES.clone()))?;
        REGISTRY.register(Box::new(TRANSPORT_FAILURES.clone()))?;
        REGISTRY.register(Box::new(DEREGISTRATION_FAILURES.clone()))?;
        REGISTRY.register(Box::new(STREAM_UPTIME_SECONDS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, state: &SessionState) {
        SESSION_STATE.set(state.as_metric());
    }

    fn report_registration(&self, accepted: bool) {
        if accepted {
            REGISTRATIONS.inc();
        } else {
            REGISTRATION_FAILURES.inc();
        }
    }

    fn report_transport_failure(&self) {
        TRANSPORT_FAILURES.inc();
    }

    fn report_deregistration(&self, acknowledged: bool) {
        if !acknowledged {
            DEREGISTRATION_FAILURES.inc();
        }
    }

    fn report_uptime(&self, uptime_secs: f64) {
        STREAM_UPTIME_SECONDS.set(uptime_secs);
    }
}
