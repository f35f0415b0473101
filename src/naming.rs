//! Working and final file names
//!
//! Working names are unique per acquisition without any coordination between
//! concurrent requests: a millisecond timestamp plus a 64-bit random token.
//! Final names are derived from the source title and are only made unique at
//! finalization time (see [`crate::resolver::finalize`]).

use crate::error::{Error, Result};
use crate::types::{TargetFormat, WorkingName};
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Longest name portion (excluding the extension) of a final file name
pub const MAX_NAME_CHARS: usize = 100;

/// Name used when sanitization leaves nothing usable
pub const FALLBACK_NAME: &str = "download";

#[allow(clippy::expect_used)]
static HOSTILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("static regex"));

#[allow(clippy::expect_used)]
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

#[allow(clippy::expect_used)]
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-.]").expect("static regex"));

/// Generate the working name for a new acquisition.
///
/// The prefix is `<tag>_<unix millis>_<16 hex chars>`, e.g.
/// `audio_1760612345678_5f0c9a7e13b2d4c8`.
pub fn make_working_prefix(format: TargetFormat) -> WorkingName {
    let millis = chrono::Utc::now().timestamp_millis();
    let token: u64 = rand::thread_rng().r#gen();

    WorkingName {
        prefix: format!("{}_{}_{:016x}", format.tag(), millis, token),
        target_extension: format.extension().to_string(),
    }
}

/// Turn a source title into a safe file name stem.
///
/// Sanitizing an already sanitized stem returns it unchanged.
pub fn sanitize_title(title: &str) -> String {
    let decoded = match urlencoding::decode(title) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(title.as_bytes()))
            .into_owned(),
    };

    let name = HOSTILE_RE.replace_all(&decoded, "");
    let name = WS_RE.replace_all(&name, " ");
    let name = name.replace('&', "and");
    let name = NON_WORD_RE.replace_all(&name, "");
    // stripping can leave runs of spaces behind
    let name = WS_RE.replace_all(&name, " ");
    // dots and spaces can alternate at the start (". .abc")
    let mut name: &str = &name;
    loop {
        let stripped = name.trim().trim_start_matches('.');
        if stripped.len() == name.len() {
            break;
        }
        name = stripped;
    }

    let truncated: String = name.chars().take(MAX_NAME_CHARS).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() || truncated.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        truncated.to_string()
    }
}

/// Build the display file name for an artifact: `<sanitized title>.<extension>`.
///
/// The extension is appended verbatim and never counts against the
/// [`MAX_NAME_CHARS`] limit.
pub fn make_final_name(title: &str, target_extension: &str) -> String {
    let extension = target_extension.trim_start_matches('.');
    format!("{}.{}", sanitize_title(title), extension)
}

/// Check that a client-supplied name addresses a file directly inside the
/// shared directory.
pub fn validate_served_name(name: &str) -> Result<&str> {
    let invalid = name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(Error::InvalidFileName(name.to_string()));
    }
    Ok(name)
}

/// Split `name` into stem and lower-cased extension (without the dot).
pub fn split_extension(name: &str) -> (&str, Option<String>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (name, None),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_prefix_is_tagged_and_unique() {
        let a = make_working_prefix(TargetFormat::Audio);
        let b = make_working_prefix(TargetFormat::Audio);
        assert!(a.prefix.starts_with("audio_"));
        assert_eq!(a.target_extension, "mp3");
        assert_ne!(a.prefix, b.prefix);

        let v = make_working_prefix(TargetFormat::Video);
        assert!(v.prefix.starts_with("video_"));
        assert_eq!(v.target_extension, "mp4");
    }

    #[test]
    fn working_prefix_contains_no_dot() {
        // the resolver splits on the last dot; the prefix must survive intact
        let name = make_working_prefix(TargetFormat::Video);
        assert!(!name.prefix.contains('.'));
        assert_eq!(name.prefix.split('_').count(), 3);
    }

    #[test]
    fn many_concurrent_prefixes_do_not_collide() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..500)
                        .map(|_| make_working_prefix(TargetFormat::Audio).prefix)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = std::collections::HashSet::new();
        for handle in handles {
            for prefix in handle.join().unwrap() {
                assert!(all.insert(prefix), "duplicate working prefix");
            }
        }
        assert_eq!(all.len(), 4000);
    }

    #[test]
    fn ampersand_becomes_and() {
        assert_eq!(make_final_name("Test & Song", "mp3"), "Test and Song.mp3");
    }

    #[test]
    fn hostile_characters_are_removed() {
        let title = r#"a\b/c*d?e:f"g<h>i|j"#;
        let name = make_final_name(title, "mp4");
        for c in ['\\', '/', '*', '?', ':', '"', '<', '>', '|'] {
            assert!(!name.contains(c), "char {:?} should be stripped from {}", c, name);
        }
        assert_eq!(name, "abcdefghij.mp4");
    }

    #[test]
    fn url_encoded_titles_are_decoded() {
        assert_eq!(make_final_name("My%20Song%21", "mp3"), "My Song.mp3");
        assert_eq!(make_final_name("Caf%C3%A9", "mp3"), "Café.mp3");
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            make_final_name("  lots \t of\n\nspace  ", "mp3"),
            "lots of space.mp3"
        );
        assert_eq!(make_final_name("one ! two", "mp3"), "one two.mp3");
    }

    #[test]
    fn word_characters_hyphens_and_dots_survive() {
        assert_eq!(
            make_final_name("Artist - Track_01 (Live) [HD] v1.2", "mp3"),
            "Artist - Track_01 Live HD v1.2.mp3"
        );
    }

    #[test]
    fn long_titles_truncate_name_but_keep_extension() {
        let title = "x".repeat(250);
        let name = make_final_name(&title, "mp4");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(stem.chars().count(), MAX_NAME_CHARS);
        assert_eq!(ext, "mp4");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let title = "é".repeat(150);
        let stem = sanitize_title(&title);
        assert_eq!(stem.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn empty_or_dot_titles_fall_back() {
        assert_eq!(make_final_name("", "mp3"), "download.mp3");
        assert_eq!(make_final_name(".", "mp3"), "download.mp3");
        assert_eq!(make_final_name("???", "mp3"), "download.mp3");
        assert_eq!(make_final_name("   ", "mp4"), "download.mp4");
    }

    #[test]
    fn extension_dot_is_not_doubled() {
        assert_eq!(make_final_name("clip", ".mp4"), "clip.mp4");
    }

    #[test]
    fn alternating_leading_dots_and_spaces_are_stripped() {
        assert_eq!(sanitize_title(". .abc"), "abc");
        assert_eq!(sanitize_title(" . . x"), "x");
        assert_eq!(sanitize_title(". . ."), FALLBACK_NAME);
    }

    #[test]
    fn sanitized_names_are_fixed_points() {
        let long = "long title ".repeat(30);
        let titles = [
            "Test & Song",
            "100%25 pure",
            "a  !  b",
            r#"Video: "Best of 2024" <HD> | 1080p"#,
            long.as_str(),
            ".hidden",
            ". .abc",
            " . . x",
            "",
        ];
        for title in titles {
            let once = sanitize_title(title);
            assert_eq!(sanitize_title(&once), once, "not a fixed point for {:?}", title);
        }
    }

    #[test]
    fn served_names_must_be_bare() {
        assert!(validate_served_name("Test and Song.mp3").is_ok());
        assert!(validate_served_name("").is_err());
        assert!(validate_served_name("../etc/passwd").is_err());
        assert!(validate_served_name("a/b.mp3").is_err());
        assert!(validate_served_name("a\\b.mp3").is_err());
        assert!(validate_served_name(".env").is_err());
        assert!(validate_served_name("..").is_err());
        assert!(validate_served_name("Wait... what.mp3").is_ok());
    }

    #[test]
    fn split_extension_lowercases() {
        assert_eq!(split_extension("clip.WEBM"), ("clip", Some("webm".to_string())));
        assert_eq!(split_extension("v1.2.mp3"), ("v1.2", Some("mp3".to_string())));
        assert_eq!(split_extension("noext"), ("noext", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
    }
}
