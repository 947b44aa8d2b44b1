use crate::domain::value_objects::{AudioParams, VideoParams};

/// H.264 encoder element family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    Software,
    Vaapi,
}

impl VideoEncoder {
    pub fn element_name(&self) -> &'static str {
        match self {
            VideoEncoder::Software => "x264enc",
            VideoEncoder::Vaapi => "vaapih264enc",
        }
    }
}

/// Elements chosen for the capture pipeline after probing the registry
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureElements {
    pub video_source: &'static str,
    pub video_encoder: VideoEncoder,
    pub audio_source: &'static str,
    pub audio_encoder: &'static str,
    pub audio_dsp: bool,
}

impl Default for CaptureElements {
    fn default() -> Self {
        Self {
            video_source: "autovideosrc",
            video_encoder: VideoEncoder::Software,
            audio_source: "autoaudiosrc",
            audio_encoder: "avenc_aac",
            audio_dsp: false,
        }
    }
}

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Capture, encode and announce to `target_url` through rtspclientsink
    pub fn build_capture_string(
        elements: &CaptureElements,
        video: &VideoParams,
        audio: &AudioParams,
        target_url: &str,
    ) -> String {
        format!(
            "rtspclientsink name=sink location={} protocols=tcp {} ! videoconvert ! {}videoscale ! videorate ! \
             video/x-raw,width={},height={},framerate={}/1 ! {} ! h264parse config-interval=-1 ! sink. \
             {} ! audioconvert ! audioresample ! audio/x-raw,rate={},channels={} ! {}audioconvert ! \
             {} bitrate={} ! aacparse ! sink.",
            target_url,
            elements.video_source,
            Self::rotation_stage(video.rotation()),
            video.width(),
            video.height(),
            video.fps(),
            Self::encoder_stage(elements.video_encoder, video),
            elements.audio_source,
            audio.sample_rate(),
            audio.channels(),
            Self::dsp_stage(elements.audio_dsp, audio),
            elements.audio_encoder,
            audio.bitrate(),
        )
    }

    fn rotation_stage(degrees: u16) -> &'static str {
        match degrees {
            90 => "videoflip method=clockwise ! ",
            180 => "videoflip method=rotate-180 ! ",
            270 => "videoflip method=counterclockwise ! ",
            _ => "",
        }
    }

    fn encoder_stage(encoder: VideoEncoder, video: &VideoParams) -> String {
        let kbps = (video.bitrate() / 1000).max(1);
        let keyframe_interval = video.fps() * 2;

        match encoder {
            VideoEncoder::Software => format!(
                "x264enc bitrate={} tune=zerolatency speed-preset=ultrafast key-int-max={}",
                kbps, keyframe_interval
            ),
            VideoEncoder::Vaapi => format!(
                "vaapih264enc bitrate={} keyframe-period={}",
                kbps, keyframe_interval
            ),
        }
    }

    fn dsp_stage(enabled: bool, audio: &AudioParams) -> String {
        if !enabled || !(audio.echo_cancel() || audio.noise_reduction()) {
            return String::new();
        }
        format!(
            "webrtcdsp echo-cancel={} noise-suppression={} ! ",
            audio.echo_cancel(),
            audio.noise_reduction()
        )
    }
}
