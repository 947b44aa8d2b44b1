use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::{MediaConfig, StreamRegistration};

/// Port for the remote service that allocates RTSP endpoints.
///
/// Implementations make a single attempt per call; callers never retry.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Ask the control-plane to open an endpoint for a stream captured with `media`
    async fn register(&self, media: &MediaConfig) -> Result<StreamRegistration>;

    /// Ask the control-plane to tear the stream down
    async fn deregister(&self, stream_id: i64) -> Result<()>;
}
