//! Storage keys and the allow-list guard.
//!
//! Every object the gateway touches is addressed by a [`StorageKey`]: a
//! normalized, POSIX-style path that starts with the configured allowed
//! prefix (`hls/` by default) and never contains a `.` or `..` segment.
//! The only ways to obtain one are [`StorageKey::resolve`] (playlist
//! references) and [`StorageKey::from_request_path`] (route parameters).
//!
//! Keys always hold the decoded object name; [`StorageKey::url_path`]
//! encodes it again for use in a URL.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{Error, Result};

const MANIFEST_SUFFIX: &str = ".m3u8";

/// Characters escaped inside one path segment of a URL
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Classification of a resolved reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A nested playlist, served back through the manifest route
    Manifest,
    /// A media segment or encryption key, served through the redirect route
    Segment,
}

/// A normalized object key under the allowed prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Resolve `reference` against `base_dir` (a directory ending in `/`, or
    /// empty for the bucket root) and guard the result.
    ///
    /// `reference` is URL text as written in a playlist and is percent-decoded
    /// before joining, so `%2e%2e` is a `..` like any other. References
    /// starting with `/` are taken from the bucket root.
    pub fn resolve(base_dir: &str, reference: &str, allowed_prefix: &str) -> Result<Self> {
        let decoded = percent_decode_str(reference).decode_utf8().map_err(|_| {
            Error::MalformedPlaylist(format!("'{reference}' does not decode to UTF-8"))
        })?;
        let joined = match decoded.strip_prefix('/') {
            Some(rooted) => rooted.to_string(),
            None => format!("{base_dir}{decoded}"),
        };

        let normalized = normalize_path(&joined)
            .ok_or_else(|| Error::PathTraversal(format!("'{reference}' climbs above the bucket root")))?;
        check_prefix(&normalized, allowed_prefix)?;

        Ok(Self(normalized))
    }

    /// Accept a key taken verbatim from a request path.
    ///
    /// `raw` is already decoded (the router decodes path parameters). Unlike
    /// [`StorageKey::resolve`] nothing is joined or collapsed: the key must
    /// already be in normal form.
    pub fn from_request_path(raw: &str, allowed_prefix: &str) -> Result<Self> {
        let raw = raw.strip_prefix('/').unwrap_or(raw);

        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(Error::PathTraversal(format!("'{raw}' is not a normalized key")));
        }
        check_prefix(raw, allowed_prefix)?;
        check_decoded(raw, allowed_prefix)?;

        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key with each segment percent-encoded, ready to append to a URL
    #[must_use]
    pub fn url_path(&self) -> String {
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Everything up to and including the final `/`.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.0.rfind('/').map_or("", |idx| &self.0[..=idx])
    }

    #[must_use]
    pub fn is_manifest(&self) -> bool {
        self.0.ends_with(MANIFEST_SUFFIX)
    }

    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        if self.is_manifest() {
            ReferenceKind::Manifest
        } else {
            ReferenceKind::Segment
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a path using POSIX rules.
///
/// Drops empty and `.` segments and resolves `..` against the preceding
/// segment. Returns `None` when a `..` would climb above the root.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    Some(parts.join("/"))
}

fn check_prefix(key: &str, allowed_prefix: &str) -> Result<()> {
    if key.starts_with(allowed_prefix) && key.len() > allowed_prefix.len() {
        Ok(())
    } else {
        Err(Error::PathTraversal(format!(
            "'{key}' is outside the allowed prefix '{allowed_prefix}'"
        )))
    }
}

/// Run the guard again on a second decoding so a double-encoded `%252e%252e`
/// in a request path cannot smuggle a traversal past the literal check.
fn check_decoded(path: &str, allowed_prefix: &str) -> Result<()> {
    let decoded: Cow<'_, str> = percent_decode_str(path).decode_utf8_lossy();
    if decoded == path {
        return Ok(());
    }

    let normalized = normalize_path(&decoded)
        .ok_or_else(|| Error::PathTraversal(format!("'{path}' climbs above the bucket root once decoded")))?;
    check_prefix(&normalized, allowed_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "hls/";
    const DIR: &str = "hls/video42/720p/";

    fn resolve(reference: &str) -> Result<StorageKey> {
        StorageKey::resolve(DIR, reference, PREFIX)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("hls//a/./b").as_deref(), Some("hls/a/b"));
        assert_eq!(normalize_path("hls/a/../b").as_deref(), Some("hls/b"));
        assert_eq!(normalize_path("/hls/a/").as_deref(), Some("hls/a"));
        assert_eq!(normalize_path("hls/../.."), None);
    }

    #[test]
    fn test_relative_forms_match_posix_join() {
        assert_eq!(resolve("./seg.ts").unwrap().as_str(), "hls/video42/720p/seg.ts");
        assert_eq!(resolve("seg.ts").unwrap().as_str(), "hls/video42/720p/seg.ts");
        assert_eq!(resolve("sub/seg.ts").unwrap().as_str(), "hls/video42/720p/sub/seg.ts");
        assert_eq!(resolve("../seg.ts").unwrap().as_str(), "hls/video42/seg.ts");
        assert_eq!(resolve("..//480p/./seg.ts").unwrap().as_str(), "hls/video42/480p/seg.ts");
    }

    #[test]
    fn test_root_relative_reference() {
        let key = resolve("/hls/other/seg.ts").unwrap();
        assert_eq!(key.as_str(), "hls/other/seg.ts");

        assert!(matches!(resolve("/private/seg.ts"), Err(Error::PathTraversal(_))));
    }

    #[test]
    fn test_multi_hop_traversal_rejected() {
        let err = StorageKey::resolve("hls/a/", "../../escape.ts", PREFIX).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));

        assert!(resolve("../../../secret").is_err());
        assert!(resolve("../../../../../../etc/passwd").is_err());
        assert!(resolve("../../../hls/../secret/x.ts").is_err());
    }

    #[test]
    fn test_encoded_traversal_rejected() {
        assert!(StorageKey::resolve("hls/a/", "%2e%2e/%2e%2e/escape.ts", PREFIX).is_err());
        assert!(StorageKey::resolve("hls/a/", "..%2f..%2fescape.ts", PREFIX).is_err());
    }

    #[test]
    fn test_references_are_decoded() {
        let key = resolve("seg%20one.ts").unwrap();
        assert_eq!(key.as_str(), "hls/video42/720p/seg one.ts");
        assert_eq!(key.url_path(), "hls/video42/720p/seg%20one.ts");

        assert!(matches!(resolve("seg%ff.ts"), Err(Error::MalformedPlaylist(_))));
    }

    #[test]
    fn test_url_path_escapes_reserved_characters() {
        let key = StorageKey::from_request_path("hls/a#b/my video/100%?.ts", PREFIX).unwrap();
        assert_eq!(key.url_path(), "hls/a%23b/my%20video/100%25%3F.ts");

        let key = StorageKey::resolve("hls/my video/", "720p/index.m3u8", PREFIX).unwrap();
        assert_eq!(key.as_str(), "hls/my video/720p/index.m3u8");
        assert_eq!(key.url_path(), "hls/my%20video/720p/index.m3u8");
    }

    #[test]
    fn test_prefix_itself_is_not_a_key() {
        assert!(StorageKey::resolve("", "hls/", PREFIX).is_err());
        assert!(StorageKey::resolve("", "hlsx/a.ts", PREFIX).is_err());
    }

    #[test]
    fn test_from_request_path() {
        let key = StorageKey::from_request_path("hls/video42/master.m3u8", PREFIX).unwrap();
        assert_eq!(key.as_str(), "hls/video42/master.m3u8");
        assert_eq!(key.directory(), "hls/video42/");
        assert!(key.is_manifest());
        assert_eq!(key.kind(), ReferenceKind::Manifest);

        assert!(StorageKey::from_request_path("hls/a/../../etc/passwd", PREFIX).is_err());
        assert!(StorageKey::from_request_path("hls//a.ts", PREFIX).is_err());
        assert!(StorageKey::from_request_path("hls/./a.ts", PREFIX).is_err());
        assert!(StorageKey::from_request_path("videos/a.ts", PREFIX).is_err());
        assert!(StorageKey::from_request_path("hls/%2e%2e/%2e%2e/x.ts", PREFIX).is_err());
    }

    #[test]
    fn test_segment_kind() {
        let key = resolve("enc.key").unwrap();
        assert_eq!(key.kind(), ReferenceKind::Segment);
        assert!(!key.is_manifest());
    }
}
