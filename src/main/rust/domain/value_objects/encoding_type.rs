use crate::domain::errors::{DomainError, Result};

/// Output encoding requested from the control-plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    MpegDashPassthrough,
    MpegDash,
    WebmDashVp8,
    WebmDashVp9,
}

impl EncodingType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::MpegDashPassthrough),
            1 => Ok(Self::MpegDash),
            2 => Ok(Self::WebmDashVp8),
            3 => Ok(Self::WebmDashVp9),
            other => Err(DomainError::UnknownEncodingType(other)),
        }
    }

    /// Wire code used in the `encType` field
    pub fn code(&self) -> u8 {
        match self {
            Self::MpegDashPassthrough => 0,
            Self::MpegDash => 1,
            Self::WebmDashVp8 => 2,
            Self::WebmDashVp9 => 3,
        }
    }

    /// Everything but passthrough needs the server to know the input codecs
    pub fn requires_transcoding(&self) -> bool {
        !matches!(self, Self::MpegDashPassthrough)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MpegDashPassthrough => "MPEG-DASH (passthrough)",
            Self::MpegDash => "MPEG-DASH",
            Self::WebmDashVp8 => "WebM-DASH VP8",
            Self::WebmDashVp9 => "WebM-DASH VP9",
        }
    }
}

impl Default for EncodingType {
    fn default() -> Self {
        Self::MpegDash
    }
}
