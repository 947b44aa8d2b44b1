use crate::domain::errors::{DomainError, Result};

const MAX_FPS: u32 = 120;

/// Video capture and encode parameters handed to the transport engine
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    width: u32,
    height: u32,
    fps: u32,
    bitrate: u32,
    hardware_encode: bool,
    rotation: u16,
}

impl VideoParams {
    pub fn new(width: u32, height: u32, fps: u32, bitrate: u32) -> Result<Self> {
        Self::require_positive("width", width)?;
        Self::require_positive("height", height)?;
        Self::require_positive("bitrate", bitrate)?;
        if fps == 0 || fps > MAX_FPS {
            return Err(DomainError::InvalidMediaParameter { name: "fps", value: fps });
        }

        Ok(Self {
            width,
            height,
            fps,
            bitrate,
            hardware_encode: true,
            rotation: 0,
        })
    }

    pub fn with_hardware_encode(mut self, enabled: bool) -> Self {
        self.hardware_encode = enabled;
        self
    }

    pub fn with_rotation(mut self, degrees: u16) -> Result<Self> {
        if !matches!(degrees, 0 | 90 | 180 | 270) {
            return Err(DomainError::InvalidRotation(degrees));
        }
        self.rotation = degrees;
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Bits per second
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn hardware_encode(&self) -> bool {
        self.hardware_encode
    }

    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    fn require_positive(name: &'static str, value: u32) -> Result<()> {
        if value == 0 {
            return Err(DomainError::InvalidMediaParameter { name, value });
        }
        Ok(())
    }
}

/// Audio capture and encode parameters handed to the transport engine
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParams {
    bitrate: u32,
    sample_rate: u32,
    stereo: bool,
    echo_cancel: bool,
    noise_reduction: bool,
}

impl AudioParams {
    pub fn new(bitrate: u32, sample_rate: u32) -> Result<Self> {
        if bitrate == 0 {
            return Err(DomainError::InvalidMediaParameter { name: "audio bitrate", value: bitrate });
        }
        if sample_rate == 0 {
            return Err(DomainError::InvalidMediaParameter {
                name: "sample rate",
                value: sample_rate,
            });
        }

        Ok(Self {
            bitrate,
            sample_rate,
            stereo: true,
            echo_cancel: true,
            noise_reduction: true,
        })
    }

    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn with_echo_cancel(mut self, enabled: bool) -> Self {
        self.echo_cancel = enabled;
        self
    }

    pub fn with_noise_reduction(mut self, enabled: bool) -> Self {
        self.noise_reduction = enabled;
        self
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stereo(&self) -> bool {
        self.stereo
    }

    pub fn channels(&self) -> u8 {
        if self.stereo {
            2
        } else {
            1
        }
    }

    pub fn echo_cancel(&self) -> bool {
        self.echo_cancel
    }

    pub fn noise_reduction(&self) -> bool {
        self.noise_reduction
    }
}

/// Fixed capture description for every session of the process
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    video: VideoParams,
    audio: AudioParams,
}

impl MediaConfig {
    pub fn new(video: VideoParams, audio: AudioParams) -> Self {
        Self { video, audio }
    }

    pub fn video(&self) -> &VideoParams {
        &self.video
    }

    pub fn audio(&self) -> &AudioParams {
        &self.audio
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video: VideoParams {
                width: 1280,
                height: 720,
                fps: 25,
                bitrate: 2000 * 1024,
                hardware_encode: true,
                rotation: 180,
            },
            audio: AudioParams {
                bitrate: 64 * 1024,
                sample_rate: 16000,
                stereo: true,
                echo_cancel: true,
                noise_reduction: true,
            },
        }
    }
}
