//! Browsing history preparation.
//!
//! Turns raw visits into the activity titles the interest classifier sees:
//! internal browser pages are dropped, platform names are stripped from
//! titles, and each title is kept once.

use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::HistoryRecord,
    services::providers::HistorySource,
};

/// URL schemes of pages that never reflect user interests
const IGNORED_SCHEMES: [&str; 3] = ["chrome://", "file://", "about:"];

/// Site and brand names that carry no topical meaning on their own
const PLATFORM_NAMES: [&str; 20] = [
    "YouTube",
    "Netflix",
    "Amazon",
    "Hulu",
    "Twitter",
    "Facebook",
    "Instagram",
    "Reddit",
    "Twitch",
    "Vimeo",
    "Pinterest",
    "Spotify",
    "Apple",
    "Google",
    "TikTok",
    "Disney",
    "BBC",
    "CNN",
    "Game",
    "Movie",
];

/// History supplied up front, e.g. in a request body
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    records: Vec<HistoryRecord>,
}

impl StaticHistory {
    /// Records are sorted most recent first
    pub fn new(mut records: Vec<HistoryRecord>) -> Self {
        records.sort_by(|a, b| b.visit_time.cmp(&a.visit_time));
        Self { records }
    }
}

#[async_trait::async_trait]
impl HistorySource for StaticHistory {
    async fn recent(&self, limit: usize) -> AppResult<Vec<HistoryRecord>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

/// Removes whole-word platform names from a title
pub fn strip_platform_names(title: &str) -> String {
    title
        .split_whitespace()
        .filter(|word| !PLATFORM_NAMES.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts activity titles from visits, most recent first, each title once
pub fn activity_titles(records: &[HistoryRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut titles = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        if IGNORED_SCHEMES
            .iter()
            .any(|scheme| record.url.starts_with(scheme))
        {
            skipped += 1;
            continue;
        }

        let Some(raw) = record.title.as_deref() else {
            skipped += 1;
            continue;
        };

        let title = strip_platform_names(raw);
        if title.is_empty() {
            skipped += 1;
            continue;
        }

        if seen.insert(title.clone()) {
            titles.push(title);
        }
    }

    tracing::debug!(
        record_count = records.len(),
        title_count = titles.len(),
        skipped,
        "History preprocessed"
    );

    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(url: &str, title: Option<&str>, minute: u32) -> HistoryRecord {
        HistoryRecord {
            url: url.to_string(),
            title: title.map(str::to_string),
            visit_count: 1,
            visit_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_strip_platform_names() {
        assert_eq!(strip_platform_names("YouTube Funny Cats"), "Funny Cats");
        assert_eq!(strip_platform_names("Netflix"), "");
        // Only whole words are removed
        assert_eq!(strip_platform_names("Gamers Unite"), "Gamers Unite");
    }

    #[test]
    fn test_activity_titles_skips_internal_pages() {
        let records = vec![
            record("chrome://settings", Some("Settings"), 0),
            record("file:///home/me/notes.txt", Some("notes.txt"), 1),
            record("https://example.com", Some("Comedy Central Clips"), 2),
        ];

        assert_eq!(activity_titles(&records), vec!["Comedy Central Clips"]);
    }

    #[test]
    fn test_activity_titles_keeps_first_occurrence() {
        let records = vec![
            record("https://youtube.com/a", Some("YouTube Funny Cats"), 5),
            record("https://vimeo.com/b", Some("Vimeo Funny Cats"), 4),
            record("https://news.example", Some("Stock Market News"), 3),
            record("https://untitled.example", None, 2),
        ];

        assert_eq!(
            activity_titles(&records),
            vec!["Funny Cats", "Stock Market News"]
        );
    }

    #[test]
    fn test_static_history_most_recent_first_with_limit() {
        let history = StaticHistory::new(vec![
            record("https://a", Some("Old"), 1),
            record("https://b", Some("Newest"), 30),
            record("https://c", Some("Middle"), 15),
        ]);

        let recent = tokio_test::block_on(history.recent(2)).unwrap();
        let titles: Vec<_> = recent.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["Newest", "Middle"]);
    }
}
