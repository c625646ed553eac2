// hlsgate API library
//
// HTTP routes serving rewritten HLS playlists and presigned redirects

pub mod http;

pub use http::{create_router, AppState};
