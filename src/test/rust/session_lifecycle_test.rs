use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jvs_streamer::application::services::CoordinatorHandle;
use jvs_streamer::domain::ports::StatusSink;
use jvs_streamer::domain::value_objects::{
    ActionLabel, AudioParams, Notice, StatusText, VideoParams,
};
use jvs_streamer::{
    ConnectionListener, ControlPlaneConfig, DomainError, HttpControlPlane, MediaConfig,
    MetricsReporter, RtspMode, SessionCoordinator, SessionRuntime, SessionSnapshot, SessionState,
    TransportEngine,
};
use serde_json::json;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Default)]
struct EngineLog {
    capture_supported: bool,
    transporting: bool,
    targets: Vec<String>,
    transport_stops: usize,
    recording_stops: usize,
}

struct FakeEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl TransportEngine for FakeEngine {
    fn prepare_audio(&mut self, _params: &AudioParams) -> bool {
        self.log.lock().unwrap().capture_supported
    }

    fn prepare_video(&mut self, _params: &VideoParams) -> bool {
        self.log.lock().unwrap().capture_supported
    }

    fn is_transporting(&self) -> bool {
        self.log.lock().unwrap().transporting
    }

    fn start_transport(&mut self, target_url: &str) -> jvs_streamer::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.transporting = true;
        log.targets.push(target_url.to_string());
        Ok(())
    }

    fn stop_transport(&mut self) -> jvs_streamer::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.transporting = false;
        log.transport_stops += 1;
        Ok(())
    }

    fn stop_recording(&mut self) -> jvs_streamer::Result<()> {
        self.log.lock().unwrap().recording_stops += 1;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    statuses: Mutex<Vec<StatusText>>,
    actions: Mutex<Vec<ActionLabel>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    fn last_status(&self) -> Option<StatusText> {
        self.statuses.lock().unwrap().last().copied()
    }

    fn last_action(&self) -> Option<ActionLabel> {
        self.actions.lock().unwrap().last().copied()
    }

    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn show_status(&self, status: StatusText) {
        self.statuses.lock().unwrap().push(status);
    }

    fn show_action(&self, label: ActionLabel) {
        self.actions.lock().unwrap().push(label);
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_state_change(&self, _state: &SessionState) {}
    fn report_registration(&self, _accepted: bool) {}
    fn report_transport_failure(&self) {}
    fn report_deregistration(&self, _acknowledged: bool) {}
    fn report_uptime(&self, _uptime_secs: f64) {}
}

struct TestStreamer {
    handle: CoordinatorHandle,
    task: JoinHandle<()>,
    engine: Arc<Mutex<EngineLog>>,
    sink: Arc<RecordingSink>,
}

fn accepted_reply() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": 0,
        "listPort": 5540,
        "annPath": "live",
        "id": 42
    }))
}

fn launch(server: &MockServer, mode: RtspMode, bind_engine: bool) -> TestStreamer {
    let config = ControlPlaneConfig::new(
        "127.0.0.1".to_string(),
        server.address().port(),
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
    )
    .unwrap()
    .with_mode(mode);

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, completions) = SessionCoordinator::new(
        MediaConfig::default(),
        mode,
        Arc::new(HttpControlPlane::new(config)),
        sink.clone(),
        Arc::new(NoopMetrics),
    );
    let (handle, task) = SessionRuntime::spawn(coordinator, completions, SHUTDOWN_GRACE);

    let engine = Arc::new(Mutex::new(EngineLog {
        capture_supported: true,
        ..EngineLog::default()
    }));
    if bind_engine {
        handle
            .bind_engine(Box::new(FakeEngine {
                log: engine.clone(),
            }))
            .unwrap();
    }

    TestStreamer {
        handle,
        task,
        engine,
        sink,
    }
}

async fn wait_for_state(handle: &CoordinatorHandle, state: SessionState) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = handle.snapshot().await.unwrap();
            if snapshot.state == state {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("session never reached {state}"))
}

#[tokio::test]
async fn test_start_registers_and_streams() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    let snapshot = wait_for_state(&streamer.handle, SessionState::Streaming).await;

    assert_eq!(snapshot.stream_id, Some(42));
    assert!(streamer.handle.is_running().await);
    assert_eq!(
        streamer.engine.lock().unwrap().targets,
        vec!["rtsp://127.0.0.1:5540/live".to_string()]
    );
    assert_eq!(streamer.sink.last_status(), Some(StatusText::Running));
    assert_eq!(streamer.sink.last_action(), Some(ActionLabel::Stop));
    assert!(streamer.sink.notices().contains(&Notice::StreamAccepted));
}

#[tokio::test]
async fn test_stop_deregisters_and_returns_to_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.stop().await.unwrap();
    let snapshot = wait_for_state(&streamer.handle, SessionState::Idle).await;

    assert_eq!(snapshot.stream_id, None);
    assert!(!streamer.engine.lock().unwrap().transporting);
    assert_eq!(streamer.sink.last_status(), Some(StatusText::Stopped));
    assert_eq!(streamer.sink.last_action(), Some(ActionLabel::Start));
}

#[tokio::test]
async fn test_start_while_streaming_toggles_to_stop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Idle).await;
}

#[tokio::test]
async fn test_repeated_stop_sends_one_deregistration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.stop().await.unwrap();
    streamer.handle.stop().await.unwrap();
    assert!(matches!(
        streamer.handle.start().await,
        Err(DomainError::SessionBusy(SessionState::Stopping))
    ));

    wait_for_state(&streamer.handle, SessionState::Idle).await;
}

#[tokio::test]
async fn test_rejected_registration_fails_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 1, "message": "busy"})),
        )
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    let snapshot = wait_for_state(&streamer.handle, SessionState::Failed).await;

    assert_eq!(snapshot.stream_id, None);
    assert!(streamer.engine.lock().unwrap().targets.is_empty());
    assert!(streamer.engine.lock().unwrap().recording_stops > 0);
    assert_eq!(streamer.sink.last_status(), Some(StatusText::ServerError));
    assert_eq!(streamer.sink.last_action(), Some(ActionLabel::Start));
    assert!(streamer
        .sink
        .notices()
        .contains(&Notice::RegistrationRejected("busy".to_string())));
}

#[tokio::test]
async fn test_unavailable_control_plane_fails_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Failed).await;

    assert_eq!(streamer.sink.last_status(), Some(StatusText::NetworkError));
    assert!(streamer
        .sink
        .notices()
        .contains(&Notice::ControlPlaneUnavailable));
}

#[tokio::test]
async fn test_failed_session_can_start_again() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Failed).await;

    streamer.handle.start().await.unwrap();
    let snapshot = wait_for_state(&streamer.handle, SessionState::Streaming).await;
    assert_eq!(snapshot.stream_id, Some(42));
}

#[tokio::test]
async fn test_start_without_engine_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted_reply())
        .expect(0)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, false);

    assert!(matches!(
        streamer.handle.start().await,
        Err(DomainError::CaptureContextNotBound)
    ));
    assert_eq!(
        streamer.handle.snapshot().await.unwrap().state,
        SessionState::Idle
    );
}

#[tokio::test]
async fn test_unsupported_capture_never_contacts_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted_reply())
        .expect(0)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.engine.lock().unwrap().capture_supported = false;

    assert!(matches!(
        streamer.handle.start().await,
        Err(DomainError::CaptureUnsupported)
    ));
    assert_eq!(
        streamer.handle.snapshot().await.unwrap().state,
        SessionState::Idle
    );
    assert!(streamer.sink.notices().contains(&Notice::CaptureUnsupported));
}

#[tokio::test]
async fn test_stop_during_registration_discards_late_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply().set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    assert_eq!(
        streamer.handle.snapshot().await.unwrap().state,
        SessionState::Registering
    );

    streamer.handle.stop().await.unwrap();
    assert_eq!(
        streamer.handle.snapshot().await.unwrap().state,
        SessionState::Idle
    );

    tokio::time::sleep(Duration::from_millis(500)).await;

    let snapshot = streamer.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.stream_id, None);
    assert!(streamer.engine.lock().unwrap().targets.is_empty());
}

#[tokio::test]
async fn test_connection_failure_while_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer
        .handle
        .on_connection_failed("connection refused".to_string());
    let snapshot = wait_for_state(&streamer.handle, SessionState::Failed).await;

    assert_eq!(snapshot.stream_id, None);
    assert!(!streamer.engine.lock().unwrap().transporting);
    assert_eq!(streamer.sink.last_status(), Some(StatusText::ServerError));
    assert!(streamer
        .sink
        .notices()
        .contains(&Notice::ConnectionError("connection refused".to_string())));
}

#[tokio::test]
async fn test_connection_failure_during_stop_is_suppressed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.stop().await.unwrap();
    let snapshot = streamer.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Stopping);
    assert!(snapshot.suppress_connection_errors);

    streamer.handle.on_connection_failed("socket closed".to_string());
    wait_for_state(&streamer.handle, SessionState::Idle).await;

    assert_eq!(streamer.sink.last_status(), Some(StatusText::Stopped));
    assert!(!streamer
        .sink
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::ConnectionError(_))));
}

#[tokio::test]
async fn test_disconnect_resets_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.on_disconnect();
    wait_for_state(&streamer.handle, SessionState::Idle).await;

    assert_eq!(streamer.sink.last_action(), Some(ActionLabel::Start));
    assert!(streamer.sink.notices().contains(&Notice::Disconnected));
}

#[tokio::test]
async fn test_client_mode_stops_without_deregistration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Client, true);
    streamer.handle.start().await.unwrap();
    let snapshot = wait_for_state(&streamer.handle, SessionState::Streaming).await;
    assert_eq!(snapshot.stream_id, None);

    streamer.handle.stop().await.unwrap();
    assert_eq!(
        streamer.handle.snapshot().await.unwrap().state,
        SessionState::Idle
    );
    assert!(!streamer.engine.lock().unwrap().transporting);
}

#[tokio::test]
async fn test_failed_deregistration_still_resets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.stop().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Idle).await;

    assert!(!streamer.engine.lock().unwrap().transporting);
    assert!(streamer
        .sink
        .notices()
        .contains(&Notice::ControlPlaneUnavailable));
}

#[tokio::test]
async fn test_shutdown_waits_for_deregistration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    streamer.handle.shutdown().await.unwrap();
    streamer.task.await.unwrap();

    assert!(!streamer.engine.lock().unwrap().transporting);
    assert!(matches!(
        streamer.handle.start().await,
        Err(DomainError::CoordinatorUnavailable)
    ));
    assert!(!streamer.handle.is_running().await);
}

#[tokio::test]
async fn test_shutdown_gives_up_on_hung_deregistration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(accepted_reply())
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/streams/42"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let streamer = launch(&server, RtspMode::Server, true);
    streamer.handle.start().await.unwrap();
    wait_for_state(&streamer.handle, SessionState::Streaming).await;

    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        streamer.handle.shutdown().await.unwrap();
        streamer.task.await.unwrap();
    })
    .await;

    assert!(finished.is_ok(), "shutdown blocked on the kill request");
    let log = streamer.engine.lock().unwrap();
    assert!(!log.transporting);
    assert!(log.transport_stops > 0);
}
