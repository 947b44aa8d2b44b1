mod control_plane_config;
mod encoding_type;
mod media_config;
mod rtsp_mode;
mod session_state;
mod stream_registration;
mod ui_status;

pub use control_plane_config::ControlPlaneConfig;
pub use encoding_type::EncodingType;
pub use media_config::{AudioParams, MediaConfig, VideoParams};
pub use rtsp_mode::RtspMode;
pub use session_state::SessionState;
pub use stream_registration::StreamRegistration;
pub use ui_status::{ActionLabel, Notice, StatusText};
