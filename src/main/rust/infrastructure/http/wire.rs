use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{ControlPlaneConfig, MediaConfig, StreamRegistration};

const AUDIO_CODEC: &str = "aac";
const AUDIO_BITS_PER_SAMPLE: u8 = 16;
const VIDEO_CODEC: &str = "avc";
const VIDEO_PIXEL_FORMAT: &str = "yuv420p";

/// Body of `POST /streams`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub url: String,
    pub enc_type: u8,
    pub title: String,
    pub descr: String,
    pub mode: u8,
    pub custom_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infos: Option<StreamInfos>,
}

/// Input tracks the server should expect when it transcodes
#[derive(Debug, Serialize)]
pub struct StreamInfos {
    pub streams: Vec<TrackInfo>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "codec_type", rename_all = "lowercase")]
pub enum TrackInfo {
    Audio {
        index: u8,
        codec_name: &'static str,
        sample_rate: String,
        channels: u8,
        bits_per_raw_sample: u8,
    },
    Video {
        index: u8,
        codec_name: &'static str,
        width: u32,
        height: u32,
        pix_fmt: &'static str,
        r_frame_rate: String,
    },
}

impl RegisterBody {
    pub fn for_now(config: &ControlPlaneConfig, media: &MediaConfig) -> Self {
        Self::build(config, media, Local::now().second())
    }

    /// `disambiguator` is folded into the title so repeated registrations are told apart
    pub fn build(config: &ControlPlaneConfig, media: &MediaConfig, disambiguator: u32) -> Self {
        let infos = config
            .sends_stream_infos()
            .then(|| StreamInfos::describe(media));

        Self {
            url: config.device_rtsp_url(),
            enc_type: config.encoding().code(),
            title: format!("Stream #{}-{}", config.encoding().code(), disambiguator),
            descr: config.description().to_string(),
            mode: config.mode().code(),
            custom_args: config.custom_args().to_vec(),
            infos,
        }
    }
}

impl StreamInfos {
    pub fn describe(media: &MediaConfig) -> Self {
        let audio = media.audio();
        let video = media.video();

        Self {
            streams: vec![
                TrackInfo::Audio {
                    index: 0,
                    codec_name: AUDIO_CODEC,
                    sample_rate: audio.sample_rate().to_string(),
                    channels: audio.channels(),
                    bits_per_raw_sample: AUDIO_BITS_PER_SAMPLE,
                },
                TrackInfo::Video {
                    index: 1,
                    codec_name: VIDEO_CODEC,
                    width: video.width(),
                    height: video.height(),
                    pix_fmt: VIDEO_PIXEL_FORMAT,
                    r_frame_rate: format!("{}/1000", video.fps() * 1000),
                },
            ],
        }
    }
}

/// Reply to `POST /streams`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReply {
    pub status: i64,
    pub list_port: Option<u16>,
    pub ann_path: Option<String>,
    pub id: Option<i64>,
    pub message: Option<String>,
}

impl RegisterReply {
    pub fn into_registration(self, config: &ControlPlaneConfig) -> Result<StreamRegistration> {
        if self.status != 0 {
            return Err(DomainError::RegistrationRejected {
                status: self.status,
                message: self
                    .message
                    .unwrap_or_else(|| "no message from server".to_string()),
            });
        }

        let listen_port = self
            .list_port
            .ok_or_else(|| DomainError::MalformedReply("missing listPort".to_string()))?;
        let announce_path = self
            .ann_path
            .ok_or_else(|| DomainError::MalformedReply("missing annPath".to_string()))?;
        let stream_id = self
            .id
            .ok_or_else(|| DomainError::MalformedReply("missing id".to_string()))?;

        Ok(StreamRegistration::new(
            config.host().to_string(),
            listen_port,
            announce_path,
            stream_id,
        ))
    }
}
