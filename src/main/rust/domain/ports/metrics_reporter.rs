use crate::domain::value_objects::SessionState;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_state_change(&self, state: &SessionState);
    fn report_registration(&self, accepted: bool);
    fn report_transport_failure(&self);
    fn report_deregistration(&self, acknowledged: bool);
    fn report_uptime(&self, uptime_secs: f64);
}
