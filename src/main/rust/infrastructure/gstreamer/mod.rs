#[cfg(feature = "gstreamer")]
mod gstreamer_engine;
mod pipeline_builder;

#[cfg(feature = "gstreamer")]
pub use gstreamer_engine::GStreamerEngine;
pub use pipeline_builder::{CaptureElements, PipelineBuilder, VideoEncoder};
