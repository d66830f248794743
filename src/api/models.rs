use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("static regex is valid")
});

#[derive(Debug, Serialize)]
pub struct VideoListRequest<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
    pub next_page_token: Option<String>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: Option<u32>,
    pub results_per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub snippet: Option<Snippet>,
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    /// ISO-8601, e.g. `PT4M13S`.
    pub duration: Option<String>,
    pub definition: Option<String>,
}

/// A video picked from a release, as kept in the playlist and as the active video.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVideo {
    pub video: VideoItem,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    pub volume: u8,
    pub active_video: Option<SelectedVideo>,
}

impl VideoItem {
    pub fn title(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn channel(&self) -> Option<&str> {
        self.snippet.as_ref().and_then(|s| s.channel_title.as_deref())
    }

    pub fn iso_duration(&self) -> Option<&str> {
        self.content_details
            .as_ref()
            .and_then(|d| d.duration.as_deref())
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.iso_duration().and_then(parse_iso8601_duration)
    }
}

impl AsRef<VideoItem> for VideoItem {
    fn as_ref(&self) -> &VideoItem {
        self
    }
}

impl AsRef<VideoItem> for SelectedVideo {
    fn as_ref(&self) -> &VideoItem {
        &self.video
    }
}

/// Groups videos by uploader channel, keeping their order within a channel.
pub fn group_by_channel<T: AsRef<VideoItem>>(
    entries: impl IntoIterator<Item = T>,
) -> BTreeMap<String, Vec<T>> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for entry in entries {
        let channel = entry
            .as_ref()
            .channel()
            .unwrap_or("Unknown channel")
            .to_string();
        groups.entry(channel).or_default().push(entry);
    }
    groups
}

impl VideoListResponse {
    pub fn find(&self, id: &str) -> Option<&VideoItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Parses an ISO-8601 duration (days and time components only) into milliseconds.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(value.trim())?;
    if value.trim() == "P" || value.trim() == "PT" {
        return None;
    }

    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let seconds = part(1) * 86_400.0 + part(2) * 3_600.0 + part(3) * 60.0 + part(4);
    Some((seconds * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, channel: Option<&str>, duration: Option<&str>) -> VideoItem {
        VideoItem {
            id: id.to_string(),
            snippet: Some(Snippet {
                title: Some(format!("Title {}", id)),
                description: None,
                channel_id: None,
                channel_title: channel.map(str::to_string),
                published_at: None,
            }),
            content_details: Some(ContentDetails {
                duration: duration.map(str::to_string),
                definition: None,
            }),
        }
    }

    #[test]
    fn parses_iso_durations() {
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253_000));
        assert_eq!(parse_iso8601_duration("PT1H"), Some(3_600_000));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45_000));
        assert_eq!(parse_iso8601_duration("P1DT1S"), Some(86_401_000));
        assert_eq!(parse_iso8601_duration("PT0.5S"), Some(500));
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("4:13"), None);
    }

    #[test]
    fn reads_video_list_response() {
        let json = r#"{
            "items": [
                {
                    "id": "abc123",
                    "snippet": { "title": "Side A", "channelTitle": "Label" },
                    "contentDetails": { "duration": "PT3M20S" }
                },
                { "id": "xyz789" }
            ]
        }"#;

        let response: VideoListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);

        let first = response.find("abc123").unwrap();
        assert_eq!(first.title(), "Side A");
        assert_eq!(first.channel(), Some("Label"));
        assert_eq!(first.duration_ms(), Some(200_000));

        let second = response.find("xyz789").unwrap();
        assert_eq!(second.title(), "xyz789");
        assert_eq!(second.duration_ms(), None);
    }

    #[test]
    fn groups_items_by_channel() {
        let response = VideoListResponse {
            items: vec![
                item("a", Some("Label"), None),
                item("b", None, None),
                item("c", Some("Label"), None),
            ],
            ..Default::default()
        };

        let groups = group_by_channel(&response.items);
        assert_eq!(groups["Label"].len(), 2);
        assert_eq!(groups["Unknown channel"][0].id, "b");
    }

    #[test]
    fn request_body_lists_ids() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(VideoListRequest { ids: &ids }).unwrap();
        assert_eq!(body, serde_json::json!({ "ids": ["a", "b"] }));
    }
}
