//! HLS playlist rewriting
//!
//! Turns a stored `.m3u8` playlist into one whose every nested reference
//! points back at the gateway: nested playlists at `/hls/{key}`, segments and
//! keys at `/hls-seg/{key}`. Pure string work, no I/O.

pub mod line;
pub mod resolve;
pub mod rewrite;

pub use line::{classify, LineKind};
pub use resolve::{Resolution, ResolvedReference, Resolver};
pub use rewrite::PlaylistRewriter;

/// Route serving rewritten playlists
pub const MANIFEST_ROUTE: &str = "/hls/";
/// Route redirecting to presigned object URLs
pub const SEGMENT_ROUTE: &str = "/hls-seg/";
