//! Playlist rewriting
//!
//! Output is byte-for-byte the input except for the URI substrings that were
//! resolved. Any reference that fails to resolve fails the whole playlist:
//! dropping a line would desynchronize the segment list from the media.

use hlsgate_core::{Error, Result, StorageKey};

use crate::line::{classify, LineKind};
use crate::resolve::{Resolution, Resolver};

#[derive(Debug, Clone)]
pub struct PlaylistRewriter {
    api_base: String,
    resolver: Resolver,
}

impl PlaylistRewriter {
    #[must_use]
    pub fn new(api_base: &str, allowed_prefix: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        Self {
            api_base: api_base.to_string(),
            resolver: Resolver::new(api_base, allowed_prefix),
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Rewrite a raw playlist body, rejecting anything that is not UTF-8
    pub fn rewrite_bytes(&self, bytes: &[u8], playlist: &StorageKey) -> Result<String> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            Error::MalformedPlaylist(format!("'{playlist}' is not valid UTF-8: {e}"))
        })?;
        self.rewrite(text, playlist)
    }

    /// Rewrite every reference in `text`, a playlist stored at `playlist`
    pub fn rewrite(&self, text: &str, playlist: &StorageKey) -> Result<String> {
        let mut output = String::with_capacity(text.len() + text.len() / 2);
        let mut rewritten = 0usize;

        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                output.push('\n');
            }

            let (raw, span) = match classify(line) {
                LineKind::Blank | LineKind::CommentOnly => {
                    output.push_str(line);
                    continue;
                }
                LineKind::CommentWithUriAttribute { raw_value, span, .. }
                | LineKind::PlainUri { raw_value, span } => (raw_value, span),
            };

            let resolution = self.resolver.resolve(playlist, raw).map_err(|e| {
                tracing::warn!(
                    playlist = %playlist,
                    line = index + 1,
                    reference = %raw,
                    "Rejected playlist reference: {e}"
                );
                e
            })?;

            match resolution {
                Resolution::Internal(reference) => {
                    output.push_str(&line[..span.start]);
                    output.push_str(&reference.internal_url(&self.api_base));
                    output.push_str(&line[span.end..]);
                    rewritten += 1;
                }
                Resolution::Passthrough => output.push_str(line),
            }
        }

        tracing::debug!(playlist = %playlist, rewritten, "Rewrote playlist");

        Ok(output)
    }
}
