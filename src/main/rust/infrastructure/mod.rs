pub mod console;
pub mod gstreamer;
pub mod http;
pub mod metrics;
pub mod network;
