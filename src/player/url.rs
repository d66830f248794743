use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Recognised link shapes, tried in order.
static VIDEO_URL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^https?://(?:www\.|m\.)?youtube\.com/.*?[?&]v=([A-Za-z0-9_-]+)")
            .expect("static regex is valid"),
        Regex::new(r"^https?://youtu\.be/([A-Za-z0-9_-]+)").expect("static regex is valid"),
    ]
});

pub fn video_id_from_url(url: &str) -> Result<String> {
    let url = url.trim();
    VIDEO_URL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| Error::NoMatch {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_links() {
        assert_eq!(video_id_from_url("https://youtu.be/abc123").unwrap(), "abc123");
        assert_eq!(video_id_from_url("http://youtu.be/abc123?t=42").unwrap(), "abc123");
    }

    #[test]
    fn watch_links() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=xyz789").unwrap(),
            "xyz789"
        );
        assert_eq!(
            video_id_from_url("https://youtube.com/watch?feature=share&v=a-B_9").unwrap(),
            "a-B_9"
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=xyz789&list=PL1#t=3").unwrap(),
            "xyz789"
        );
    }

    #[test]
    fn anything_else_is_no_match() {
        for url in [
            "not-a-url",
            "",
            "https://vimeo.com/12345",
            "https://www.youtube.com/channel/UC123",
            "https://youtu.be/",
        ] {
            assert!(
                matches!(video_id_from_url(url), Err(Error::NoMatch { .. })),
                "{url}"
            );
        }
    }
}
