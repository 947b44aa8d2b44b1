mod control_plane_client;
mod wire;

pub use control_plane_client::HttpControlPlane;
pub use wire::{RegisterBody, RegisterReply, StreamInfos, TrackInfo};
