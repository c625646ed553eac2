//! URI resolution
//!
//! Maps a raw reference found in a playlist to the storage key it names, or
//! decides that the reference is not ours to touch.

use hlsgate_core::{Error, ReferenceKind, Result, StorageKey};
use url::Url;

use crate::{MANIFEST_ROUTE, SEGMENT_ROUTE};

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Names an object under the allowed prefix
    Internal(ResolvedReference),
    /// Third-party URL, or one that already points at the gateway
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub key: StorageKey,
    pub kind: ReferenceKind,
    /// Querystring and/or fragment copied from the reference, with its
    /// leading `?` or `#`
    pub suffix: String,
}

impl ResolvedReference {
    /// Gateway URL serving this reference
    #[must_use]
    pub fn internal_url(&self, api_base: &str) -> String {
        let route = match self.kind {
            ReferenceKind::Manifest => MANIFEST_ROUTE,
            ReferenceKind::Segment => SEGMENT_ROUTE,
        };
        format!("{api_base}{route}{}{}", self.key.url_path(), self.suffix)
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    allowed_prefix: String,
    /// Origin of the gateway's public base URL, when one is configured
    origin: Option<Url>,
    /// Prefixes of references the gateway itself produced
    internal_prefixes: Vec<String>,
}

impl Resolver {
    /// `api_base` is the gateway's public base URL without a trailing `/`, or
    /// empty for root-relative output.
    #[must_use]
    pub fn new(api_base: &str, allowed_prefix: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        let origin = Url::parse(api_base).ok().filter(|url| url.has_host());

        let mut bases = vec![api_base.to_string()];
        if let Some(origin) = &origin {
            let path = origin.path().trim_end_matches('/').to_string();
            if !bases.contains(&path) {
                bases.push(path);
            }
        }

        let internal_prefixes = bases
            .iter()
            .flat_map(|base| {
                [MANIFEST_ROUTE, SEGMENT_ROUTE]
                    .into_iter()
                    .map(move |route| format!("{base}{route}{allowed_prefix}"))
            })
            .collect();

        Self {
            allowed_prefix: allowed_prefix.to_string(),
            origin,
            internal_prefixes,
        }
    }

    /// Resolve `raw` as found in `playlist`
    ///
    /// Fails with [`Error::PathTraversal`] when a bucket reference lands
    /// outside the allowed prefix.
    pub fn resolve(&self, playlist: &StorageKey, raw: &str) -> Result<Resolution> {
        if self.is_internal(raw) {
            return Ok(Resolution::Passthrough);
        }

        if raw.starts_with("//") {
            return match &self.origin {
                Some(origin) => self.resolve_absolute(&format!("{}:{raw}", origin.scheme())),
                None => Ok(Resolution::Passthrough),
            };
        }

        if has_scheme(raw) {
            return self.resolve_absolute(raw);
        }

        let (path, suffix) = split_suffix(raw);
        self.resolve_path(playlist.directory(), path, suffix)
    }

    fn is_internal(&self, raw: &str) -> bool {
        self.internal_prefixes
            .iter()
            .any(|prefix| raw.starts_with(prefix.as_str()))
    }

    fn resolve_absolute(&self, raw: &str) -> Result<Resolution> {
        let Ok(url) = Url::parse(raw) else {
            return Ok(Resolution::Passthrough);
        };
        let same_origin = self
            .origin
            .as_ref()
            .is_some_and(|origin| origin.origin() == url.origin());
        if !same_origin {
            return Ok(Resolution::Passthrough);
        }

        // Keep the suffix exactly as written rather than as re-serialized
        let (_, suffix) = split_suffix(raw);
        self.resolve_path("", url.path(), suffix)
    }

    fn resolve_path(&self, base_dir: &str, path: &str, suffix: &str) -> Result<Resolution> {
        if path.is_empty() {
            return Err(Error::MalformedPlaylist(format!(
                "reference '{suffix}' has no path"
            )));
        }

        let key = StorageKey::resolve(base_dir, path, &self.allowed_prefix)?;
        Ok(Resolution::Internal(ResolvedReference {
            kind: key.kind(),
            key,
            suffix: suffix.to_string(),
        }))
    }
}

/// Split at the first `?` or `#`
fn split_suffix(raw: &str) -> (&str, &str) {
    match raw.find(|c| c == '?' || c == '#') {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    }
}

/// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
