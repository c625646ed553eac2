//! Line classification
//!
//! A playlist line is one of four shapes. Everything the rewriter changes is
//! described by a byte range into the original line, so the bytes around it
//! (whitespace, `\r`, other attributes) are copied through untouched.

use std::ops::Range;

const BOM: char = '\u{feff}';
const URI_ATTRIBUTE: &str = "URI";

/// Tags whose `URI` attribute names an object in the bucket
pub const URI_TAGS: &[&str] = &[
    "EXT-X-KEY",
    "EXT-X-MEDIA",
    "EXT-X-MAP",
    "EXT-X-SESSION-KEY",
    "EXT-X-I-FRAME-STREAM-INF",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// A comment or a tag with nothing to rewrite
    CommentOnly,
    CommentWithUriAttribute {
        tag: &'a str,
        attr_name: &'a str,
        raw_value: &'a str,
        /// Position of `raw_value` inside the line, quotes excluded
        span: Range<usize>,
    },
    PlainUri {
        raw_value: &'a str,
        /// Position of `raw_value` inside the line, surrounding whitespace excluded
        span: Range<usize>,
    },
}

/// Classify one line (without its `\n`)
#[must_use]
pub fn classify(line: &str) -> LineKind<'_> {
    let offset = if line.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let body = &line[offset..];

    let trimmed_start = body.trim_start();
    let trimmed = trimmed_start.trim_end();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    let start = offset + (body.len() - trimmed_start.len());

    if let Some(tag_line) = trimmed.strip_prefix('#') {
        return classify_tag(tag_line, start + 1);
    }

    LineKind::PlainUri {
        raw_value: trimmed,
        span: start..start + trimmed.len(),
    }
}

/// `tag_line` is the text after `#`, found at `base` in the original line.
fn classify_tag(tag_line: &str, base: usize) -> LineKind<'_> {
    let Some((tag, attributes)) = tag_line.split_once(':') else {
        return LineKind::CommentOnly;
    };
    if !URI_TAGS.contains(&tag) {
        return LineKind::CommentOnly;
    }

    let attributes_base = base + tag.len() + 1;
    match find_quoted_attribute(attributes, URI_ATTRIBUTE) {
        Some(range) if !range.is_empty() => {
            let span = attributes_base + range.start..attributes_base + range.end;
            LineKind::CommentWithUriAttribute {
                tag,
                attr_name: URI_ATTRIBUTE,
                raw_value: &attributes[range],
                span,
            }
        }
        _ => LineKind::CommentOnly,
    }
}

/// Scan an attribute list (`NAME=VALUE,NAME="VALUE",...`) for `name` with a
/// quoted value, returning the range of the value between the quotes.
///
/// Commas and `=` inside quoted values belong to the value, so a `URI=` that
/// appears inside another attribute's quoted string is never matched.
fn find_quoted_attribute(attributes: &str, name: &str) -> Option<Range<usize>> {
    let bytes = attributes.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let eq = pos + attributes[pos..].find('=')?;
        let attr_name = attributes[pos..eq].trim();
        let value_start = eq + 1;

        let (value, next) = if bytes.get(value_start) == Some(&b'"') {
            // An unterminated quote leaves the line alone
            let close = value_start + 1 + attributes[value_start + 1..].find('"')?;
            (Some(value_start + 1..close), close + 1)
        } else {
            let end = attributes[value_start..]
                .find(',')
                .map_or(bytes.len(), |i| value_start + i);
            (None, end)
        };

        if attr_name == name {
            return value;
        }

        pos = match attributes[next..].find(',') {
            Some(i) => next + i + 1,
            None => bytes.len(),
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comments() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("  \r"), LineKind::Blank);
        assert_eq!(classify("#EXTM3U"), LineKind::CommentOnly);
        assert_eq!(classify("#EXTINF:6.006,"), LineKind::CommentOnly);
        assert_eq!(classify("# just a note"), LineKind::CommentOnly);
        assert_eq!(
            classify("#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720"),
            LineKind::CommentOnly
        );
    }

    #[test]
    fn test_plain_uri_span_excludes_whitespace() {
        let line = "  seg_001.ts\r";
        let LineKind::PlainUri { raw_value, span } = classify(line) else {
            panic!("expected a plain URI");
        };
        assert_eq!(raw_value, "seg_001.ts");
        assert_eq!(&line[span], "seg_001.ts");
    }

    #[test]
    fn test_bom_skipped_for_classification() {
        assert_eq!(classify("\u{feff}#EXTM3U"), LineKind::CommentOnly);

        let line = "\u{feff}index.m3u8";
        let LineKind::PlainUri { span, .. } = classify(line) else {
            panic!("expected a plain URI");
        };
        assert_eq!(&line[span], "index.m3u8");
    }

    #[test]
    fn test_key_tag_uri() {
        let line = r#"#EXT-X-KEY:METHOD=AES-128,URI="enc.key",IV=0x1234"#;
        let LineKind::CommentWithUriAttribute {
            tag,
            attr_name,
            raw_value,
            span,
        } = classify(line)
        else {
            panic!("expected a URI attribute");
        };
        assert_eq!(tag, "EXT-X-KEY");
        assert_eq!(attr_name, "URI");
        assert_eq!(raw_value, "enc.key");
        assert_eq!(&line[span], "enc.key");
    }

    #[test]
    fn test_media_and_map_tags() {
        let media = r#"#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="aud",NAME="English",URI="audio/en.m3u8""#;
        assert!(matches!(
            classify(media),
            LineKind::CommentWithUriAttribute { raw_value: "audio/en.m3u8", .. }
        ));

        let map = r#"#EXT-X-MAP:URI="init.mp4",BYTERANGE="720@0""#;
        assert!(matches!(
            classify(map),
            LineKind::CommentWithUriAttribute { raw_value: "init.mp4", .. }
        ));
    }

    #[test]
    fn test_uri_inside_other_value_ignored() {
        let line = r#"#EXT-X-MEDIA:TYPE=AUDIO,NAME="x,URI=bad",URI="good.m3u8""#;
        assert!(matches!(
            classify(line),
            LineKind::CommentWithUriAttribute { raw_value: "good.m3u8", .. }
        ));

        let line = r#"#EXT-X-MEDIA:TYPE=AUDIO,NAME="URI=",DEFAULT=YES"#;
        assert_eq!(classify(line), LineKind::CommentOnly);
    }

    #[test]
    fn test_unrelated_tags_and_malformed_values_untouched() {
        assert_eq!(classify(r#"#EXT-X-DATERANGE:ID="a",X-URI="x.ts""#), LineKind::CommentOnly);
        assert_eq!(classify(r#"#EXT-X-KEY:METHOD=NONE"#), LineKind::CommentOnly);
        assert_eq!(classify(r#"#EXT-X-KEY:METHOD=AES-128,URI="enc.key"#), LineKind::CommentOnly);
        assert_eq!(classify(r#"#EXT-X-KEY:METHOD=AES-128,URI="""#), LineKind::CommentOnly);
        assert_eq!(classify(r#"#EXT-X-KEYS:URI="enc.key""#), LineKind::CommentOnly);
    }
}
