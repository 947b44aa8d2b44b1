use std::net::IpAddr;

use super::{EncodingType, RtspMode};
use crate::domain::errors::{DomainError, Result};

const DEFAULT_DESCRIPTION: &str = "stream ";

/// Where the control-plane lives and what every registration asks of it
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPlaneConfig {
    host: String,
    port: u16,
    device_address: IpAddr,
    encoding: EncodingType,
    mode: RtspMode,
    description: String,
    custom_args: Vec<String>,
}

impl ControlPlaneConfig {
    pub fn new(host: String, port: u16, device_address: IpAddr) -> Result<Self> {
        Self::validate_host(&host)?;
        if port == 0 {
            return Err(DomainError::InvalidPort);
        }

        Ok(Self {
            host,
            port,
            device_address,
            encoding: EncodingType::default(),
            mode: RtspMode::default(),
            description: DEFAULT_DESCRIPTION.to_string(),
            custom_args: Vec::new(),
        })
    }

    pub fn with_encoding(mut self, encoding: EncodingType) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_mode(mut self, mode: RtspMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Passthrough options forwarded to the server-side transcoder
    pub fn with_custom_args(mut self, args: Vec<String>) -> Self {
        self.custom_args = args;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn device_address(&self) -> IpAddr {
        self.device_address
    }

    pub fn encoding(&self) -> EncodingType {
        self.encoding
    }

    pub fn mode(&self) -> RtspMode {
        self.mode
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn custom_args(&self) -> &[String] {
        &self.custom_args
    }

    /// Input stream descriptions are only sent when the server transcodes what it listens to
    pub fn sends_stream_infos(&self) -> bool {
        self.encoding.requires_transcoding() && self.mode.is_server()
    }

    pub fn streams_url(&self) -> String {
        format!("http://{}:{}/streams", self.host, self.port)
    }

    pub fn stream_url(&self, stream_id: i64) -> String {
        format!("{}/{}", self.streams_url(), stream_id)
    }

    /// The device's own RTSP address as announced in the register body
    pub fn device_rtsp_url(&self) -> String {
        match self.device_address {
            IpAddr::V4(addr) => format!("rtsp://{}", addr),
            IpAddr::V6(addr) => format!("rtsp://[{}]", addr),
        }
    }

    fn validate_host(host: &str) -> Result<()> {
        if host.is_empty() || host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(DomainError::InvalidHost(host.to_string()));
        }
        Ok(())
    }
}
