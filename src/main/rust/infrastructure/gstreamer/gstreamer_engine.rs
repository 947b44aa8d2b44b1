use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use gstreamer::prelude::*;

use super::{CaptureElements, PipelineBuilder, VideoEncoder};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ConnectionListener, TransportEngine};
use crate::domain::value_objects::{AudioParams, VideoParams};

/// Timeout for bus polling (100ms allows responsive shutdown)
const BUS_POLL_TIMEOUT_MS: u64 = 100;

const AAC_ENCODERS: [&str; 3] = ["avenc_aac", "fdkaacenc", "voaacenc"];
const REQUIRED_VIDEO_ELEMENTS: [&str; 6] = [
    "autovideosrc",
    "videoconvert",
    "videoscale",
    "videorate",
    "h264parse",
    "rtspclientsink",
];
const REQUIRED_AUDIO_ELEMENTS: [&str; 4] =
    ["autoaudiosrc", "audioconvert", "audioresample", "aacparse"];

enum BusOutcome {
    Continue,
    Connected,
    Finished,
}

struct ActiveTransport {
    pipeline: gstreamer::Pipeline,
    running: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

/// Capture and RTSP announce through a GStreamer pipeline.
///
/// Connection outcomes are read off the pipeline bus on a dedicated thread and
/// reported to the listener; the listener must not call back into the engine.
pub struct GStreamerEngine {
    listener: Arc<dyn ConnectionListener>,
    elements: CaptureElements,
    audio: Option<AudioParams>,
    video: Option<VideoParams>,
    active: Option<ActiveTransport>,
}

impl GStreamerEngine {
    /// `gstreamer::init` must have been called
    pub fn new(listener: Arc<dyn ConnectionListener>) -> Self {
        Self {
            listener,
            elements: CaptureElements::default(),
            audio: None,
            video: None,
            active: None,
        }
    }

    fn available(name: &str) -> bool {
        gstreamer::ElementFactory::find(name).is_some()
    }

    fn missing<'a>(names: &[&'a str]) -> Vec<&'a str> {
        names.iter().copied().filter(|n| !Self::available(n)).collect()
    }

    fn create_pipeline(&self, target_url: &str) -> Result<gstreamer::Pipeline> {
        let (audio, video) = match (&self.audio, &self.video) {
            (Some(audio), Some(video)) => (audio, video),
            _ => {
                return Err(DomainError::TransportFailed(
                    "capture not prepared".to_string(),
                ))
            }
        };

        let pipeline_str =
            PipelineBuilder::build_capture_string(&self.elements, video, audio, target_url);
        tracing::info!("Creating pipeline: {}", pipeline_str);

        gstreamer::parse::launch(&pipeline_str)
            .map_err(|e| DomainError::TransportFailed(format!("Failed to parse pipeline: {}", e)))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| DomainError::TransportFailed("Failed to downcast to Pipeline".to_string()))
    }

    fn process_bus_message(
        msg: &gstreamer::Message,
        pipeline: &gstreamer::Pipeline,
        listener: &dyn ConnectionListener,
    ) -> BusOutcome {
        match msg.view() {
            gstreamer::MessageView::Eos(_) => {
                tracing::info!("End of stream");
                listener.on_disconnect();
                BusOutcome::Finished
            }
            gstreamer::MessageView::Error(err) => {
                let reason = format!(
                    "Error from {:?}: {} ({:?})",
                    err.src().map(|s| s.path_string()),
                    err.error(),
                    err.debug()
                );
                tracing::warn!("{}", reason);
                if is_auth_failure(&reason) {
                    listener.on_auth_error();
                } else {
                    listener.on_connection_failed(reason);
                }
                BusOutcome::Finished
            }
            gstreamer::MessageView::StateChanged(state_changed) => {
                let from_pipeline = state_changed
                    .src()
                    .map(|s| s == pipeline)
                    .unwrap_or(false);
                if from_pipeline {
                    tracing::debug!(
                        "Pipeline state changed from {:?} to {:?}",
                        state_changed.old(),
                        state_changed.current()
                    );
                    if state_changed.current() == gstreamer::State::Playing {
                        return BusOutcome::Connected;
                    }
                }
                BusOutcome::Continue
            }
            gstreamer::MessageView::Warning(warn) => {
                tracing::warn!(
                    "Warning from {:?}: {} ({:?})",
                    warn.src().map(|s| s.path_string()),
                    warn.error(),
                    warn.debug()
                );
                BusOutcome::Continue
            }
            _ => BusOutcome::Continue,
        }
    }

    fn watch_bus(
        pipeline: gstreamer::Pipeline,
        bus: gstreamer::Bus,
        running: Arc<AtomicBool>,
        listener: Arc<dyn ConnectionListener>,
    ) {
        let timeout = gstreamer::ClockTime::from_mseconds(BUS_POLL_TIMEOUT_MS);
        let mut connected = false;

        while running.load(Ordering::SeqCst) {
            let Some(msg) = bus.timed_pop(timeout) else {
                continue;
            };
            match Self::process_bus_message(&msg, &pipeline, listener.as_ref()) {
                BusOutcome::Continue => {}
                BusOutcome::Connected => {
                    if !connected {
                        connected = true;
                        listener.on_connection_success();
                    }
                }
                BusOutcome::Finished => {
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }

        let _ = pipeline.set_state(gstreamer::State::Null);
    }
}

fn is_auth_failure(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("unauthorized") || reason.contains("not authorized")
}

/// Runs blocking teardown without stalling the async worker that called it.
///
/// On a multi-thread runtime the worker hands its other tasks off first; elsewhere
/// (plain threads, current-thread runtimes) the closure just runs in place.
fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl ActiveTransport {
    fn teardown(mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
    }
}

impl TransportEngine for GStreamerEngine {
    fn prepare_audio(&mut self, params: &AudioParams) -> bool {
        let missing = Self::missing(&REQUIRED_AUDIO_ELEMENTS);
        if !missing.is_empty() {
            tracing::warn!(?missing, "Audio capture elements unavailable");
            return false;
        }

        let Some(encoder) = AAC_ENCODERS.into_iter().find(|n| Self::available(n)) else {
            tracing::warn!("No AAC encoder available");
            return false;
        };
        self.elements.audio_encoder = encoder;

        let wants_dsp = params.echo_cancel() || params.noise_reduction();
        self.elements.audio_dsp = wants_dsp && Self::available("webrtcdsp");
        if wants_dsp && !self.elements.audio_dsp {
            tracing::warn!("webrtcdsp unavailable, capturing without echo cancel or noise reduction");
        }

        self.audio = Some(params.clone());
        true
    }

    fn prepare_video(&mut self, params: &VideoParams) -> bool {
        let missing = Self::missing(&REQUIRED_VIDEO_ELEMENTS);
        if !missing.is_empty() {
            tracing::warn!(?missing, "Video capture elements unavailable");
            return false;
        }
        if params.rotation() != 0 && !Self::available("videoflip") {
            tracing::warn!("videoflip unavailable, cannot rotate capture");
            return false;
        }

        self.elements.video_encoder =
            if params.hardware_encode() && Self::available(VideoEncoder::Vaapi.element_name()) {
                VideoEncoder::Vaapi
            } else if Self::available(VideoEncoder::Software.element_name()) {
                VideoEncoder::Software
            } else {
                tracing::warn!("No H.264 encoder available");
                return false;
            };

        self.video = Some(params.clone());
        true
    }

    fn is_transporting(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| a.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn start_transport(&mut self, target_url: &str) -> Result<()> {
        self.stop_transport()?;

        let pipeline = self.create_pipeline(target_url)?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| DomainError::TransportFailed("Failed to get bus".to_string()))?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(DomainError::TransportFailed(e.to_string()));
        }

        let running = Arc::new(AtomicBool::new(true));
        let watcher = {
            let pipeline = pipeline.clone();
            let running = running.clone();
            let listener = self.listener.clone();
            std::thread::Builder::new()
                .name("gst-bus".to_string())
                .spawn(move || Self::watch_bus(pipeline, bus, running, listener))
                .map_err(|e| DomainError::TransportFailed(e.to_string()))?
        };

        tracing::info!(target = %target_url, "Transport started");
        self.active = Some(ActiveTransport {
            pipeline,
            running,
            watcher: Some(watcher),
        });
        Ok(())
    }

    fn stop_transport(&mut self) -> Result<()> {
        if let Some(active) = self.active.take() {
            run_blocking(|| active.teardown());
            tracing::info!("Transport stopped");
        }
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.audio = None;
        self.video = None;
        Ok(())
    }
}

impl Drop for GStreamerEngine {
    fn drop(&mut self) {
        let _ = self.stop_transport();
    }
}
