use crate::domain::errors::Result;
use crate::domain::value_objects::{AudioParams, VideoParams};

/// Port for the capture/encode/RTSP engine.
///
/// Connection outcomes after `start_transport` are reported asynchronously
/// through the [`ConnectionListener`] the engine was built with.
pub trait TransportEngine: Send {
    /// Returns false when the device cannot capture with these parameters
    fn prepare_audio(&mut self, audio: &AudioParams) -> bool;

    /// Returns false when the device cannot capture with these parameters
    fn prepare_video(&mut self, video: &VideoParams) -> bool;

    fn is_transporting(&self) -> bool;

    fn start_transport(&mut self, target_url: &str) -> Result<()>;

    fn stop_transport(&mut self) -> Result<()>;

    /// Release the capture devices held since preparation
    fn stop_recording(&mut self) -> Result<()>;
}

/// Sink for engine connection events
pub trait ConnectionListener: Send + Sync {
    fn on_connection_success(&self);
    fn on_connection_failed(&self, reason: String);
    fn on_disconnect(&self);
    fn on_auth_error(&self);
    fn on_auth_success(&self);
}
