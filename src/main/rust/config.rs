use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;

use crate::domain::errors::Result;
use crate::domain::value_objects::{
    AudioParams, ControlPlaneConfig, EncodingType, MediaConfig, RtspMode, VideoParams,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jvs-streamer",
    version = "0.1.0",
    about = "Captures camera and microphone and announces them over RTSP to a JVS server"
)]
pub struct Config {
    /// Control-plane host name or address
    #[arg(short = 's', long, env = "JVS_SERVER_ADDRESS", default_value = "127.0.0.1")]
    pub server_address: String,

    /// Control-plane HTTP port
    #[arg(short = 'p', long, env = "JVS_SERVER_PORT", default_value = "8081")]
    pub server_port: u16,

    /// Encoding requested from the server (0 passthrough, 1 DASH, 2 WebM VP8, 3 WebM VP9)
    #[arg(short = 'e', long, env = "JVS_ENC_TYPE", default_value = "1")]
    pub enc_type: u8,

    /// RTSP mode: server or client
    #[arg(short = 'm', long, env = "JVS_MODE", default_value = "server")]
    pub mode: String,

    /// Stream description sent with the registration
    #[arg(long, default_value = "stream ")]
    pub description: String,

    /// Extra argument forwarded to the server-side transcoder (repeatable)
    #[arg(long = "custom-arg")]
    pub custom_args: Vec<String>,

    /// Address announced to the server instead of the detected one
    #[arg(long)]
    pub device_address: Option<IpAddr>,

    #[arg(long, default_value = "1280")]
    pub width: u32,

    #[arg(long, default_value = "720")]
    pub height: u32,

    #[arg(long, default_value = "25")]
    pub fps: u32,

    /// Video bitrate in bits per second
    #[arg(long, default_value = "2048000")]
    pub video_bitrate: u32,

    /// Capture rotation in degrees
    #[arg(long, default_value = "180")]
    pub rotation: u16,

    /// Encode video in software even when a hardware encoder exists
    #[arg(long)]
    pub software_encode: bool,

    /// Audio bitrate in bits per second
    #[arg(long, default_value = "65536")]
    pub audio_bitrate: u32,

    #[arg(long, default_value = "16000")]
    pub sample_rate: u32,

    /// Capture a single audio channel
    #[arg(long)]
    pub mono: bool,

    #[arg(long)]
    pub no_echo_cancel: bool,

    #[arg(long)]
    pub no_noise_reduction: bool,

    /// Longest wait for an in-flight kill request when shutting down
    #[arg(long, default_value = "5")]
    pub shutdown_grace_secs: u64,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9001")]
    pub metrics_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_address.trim().is_empty() {
            anyhow::bail!("Server address cannot be empty");
        }
        if self.server_port == 0 {
            anyhow::bail!("Invalid server port: port cannot be 0");
        }
        Self::validate_port(self.metrics_port, "metrics")?;

        self.encoding()?;
        self.rtsp_mode()?;
        self.to_media_config()?;

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn encoding(&self) -> Result<EncodingType> {
        EncodingType::from_code(self.enc_type)
    }

    pub fn rtsp_mode(&self) -> Result<RtspMode> {
        self.mode.parse()
    }

    pub fn to_media_config(&self) -> Result<MediaConfig> {
        let video = VideoParams::new(self.width, self.height, self.fps, self.video_bitrate)?
            .with_hardware_encode(!self.software_encode)
            .with_rotation(self.rotation)?;
        let audio = AudioParams::new(self.audio_bitrate, self.sample_rate)?
            .with_stereo(!self.mono)
            .with_echo_cancel(!self.no_echo_cancel)
            .with_noise_reduction(!self.no_noise_reduction);

        Ok(MediaConfig::new(video, audio))
    }

    pub fn to_control_plane_config(&self, device_address: IpAddr) -> Result<ControlPlaneConfig> {
        Ok(ControlPlaneConfig::new(
            self.server_address.clone(),
            self.server_port,
            device_address,
        )?
        .with_encoding(self.encoding()?)
        .with_mode(self.rtsp_mode()?)
        .with_description(self.description.clone())
        .with_custom_args(self.custom_args.clone()))
    }
}
