//! Source URL shape validation
//!
//! Performed before any I/O; a URL that passes may still fail at the extractor.

use crate::error::{Error, Result};
use url::Url;

const HOST_PREFIXES: [&str; 3] = ["www.", "m.", "music."];
const PATH_KINDS: [&str; 3] = ["shorts", "live", "embed"];

/// Check that `source_url` has one of the accepted shapes and return it parsed.
///
/// Accepted: `youtube.com/watch?v=<id>`, `youtube.com/{shorts,live,embed}/<id>`
/// and `youtu.be/<id>` over http or https, with an optional `www.`, `m.` or
/// `music.` host prefix.
pub fn validate_source_url(source_url: &str) -> Result<Url> {
    let invalid = || Error::InvalidSource(source_url.to_string());

    let url = Url::parse(source_url.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let host = HOST_PREFIXES
        .iter()
        .find_map(|p| host.strip_prefix(*p))
        .unwrap_or(host.as_str());

    let mut segments = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    let accepted = match host {
        "youtube.com" => match (segments.next(), segments.next()) {
            (Some("watch"), None) => url
                .query_pairs()
                .any(|(k, v)| k == "v" && !v.trim().is_empty()),
            (Some(kind), Some(id)) => PATH_KINDS.contains(&kind) && is_video_id(id),
            _ => false,
        },
        "youtu.be" => segments.next().is_some_and(is_video_id),
        _ => false,
    };

    if accepted { Ok(url) } else { Err(invalid()) }
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=RD",
            "https://www.youtube.com/shorts/abc123DEF_-",
            "https://www.youtube.com/live/abc123",
            "https://www.youtube.com/embed/abc123",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=xyz",
            "HTTPS://WWW.YOUTUBE.COM/watch?v=dQw4w9WgXcQ",
        ] {
            assert!(validate_source_url(url).is_ok(), "should accept {}", url);
        }
    }

    #[test]
    fn rejects_everything_else() {
        for url in [
            "",
            "not a url",
            "ftp://youtube.com/watch?v=abc",
            "https://vimeo.com/12345",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?list=abc",
            "https://www.youtube.com/channel/UC123",
            "https://www.youtube.com/shorts/",
            "https://youtu.be/",
            "https://evil.com/youtube.com/watch?v=abc",
            "https://youtube.com.evil.com/watch?v=abc",
            "file:///etc/passwd",
        ] {
            let err = validate_source_url(url).unwrap_err();
            assert!(matches!(err, Error::InvalidSource(_)), "should reject {}", url);
        }
    }
}
