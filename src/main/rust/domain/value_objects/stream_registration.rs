/// Endpoint allocated by the control-plane for one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRegistration {
    host: String,
    listen_port: u16,
    announce_path: String,
    stream_id: i64,
}

impl StreamRegistration {
    pub fn new(host: String, listen_port: u16, announce_path: String, stream_id: i64) -> Self {
        Self {
            host,
            listen_port,
            announce_path,
            stream_id,
        }
    }

    pub fn stream_id(&self) -> i64 {
        self.stream_id
    }

    /// RTSP URL the transport engine announces to
    pub fn rtsp_target(&self) -> String {
        format!(
            "rtsp://{}:{}/{}",
            self.host,
            self.listen_port,
            self.announce_path.trim_start_matches('/')
        )
    }
}
