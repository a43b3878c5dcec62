//! Collapse per-season library rows into one display entry per title.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{GroupedDisplayRecord, MediaKind, SeasonRecord, TitleKey};

/// Group records by title, most recent activity first.
///
/// Shows with season rows become a single entry labelled e.g. "Seasons 1-3, 5".
/// Movies and shows tracked as a whole pass through unchanged. Timestamps that
/// fail to parse count as the Unix epoch.
pub fn group(records: &[SeasonRecord]) -> Vec<GroupedDisplayRecord> {
    let mut index: HashMap<TitleKey, usize> = HashMap::new();
    let mut buckets: Vec<Vec<&SeasonRecord>> = Vec::new();
    for record in records {
        let slot = *index.entry(record.key()).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(record);
    }

    let mut grouped: Vec<GroupedDisplayRecord> =
        buckets.iter().map(|bucket| summarize(bucket)).collect();
    grouped.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    grouped
}

fn summarize(bucket: &[&SeasonRecord]) -> GroupedDisplayRecord {
    let first = bucket[0];
    let mut seasons: Vec<u32> = bucket.iter().filter_map(|r| r.season()).collect();

    if first.media_type == MediaKind::Movie || seasons.is_empty() {
        return GroupedDisplayRecord {
            content_id: first.content_id,
            media_type: first.media_type,
            title: first.title.clone(),
            poster_path: first.poster_path.clone(),
            season_info: None,
            seasons: Vec::new(),
            timestamp: parse_timestamp(&first.timestamp),
        };
    }

    seasons.sort_unstable();
    seasons.dedup();

    let poster_path = bucket
        .iter()
        .find(|r| r.season() == Some(1))
        .and_then(|r| r.poster_path.clone())
        .or_else(|| first.poster_path.clone());
    let timestamp = bucket
        .iter()
        .map(|r| parse_timestamp(&r.timestamp))
        .max()
        .unwrap_or_default();

    GroupedDisplayRecord {
        content_id: first.content_id,
        media_type: first.media_type,
        title: strip_season_suffix(&first.title).to_string(),
        poster_path,
        season_info: season_label(&seasons),
        seasons,
        timestamp,
    }
}

/// Render sorted, unique season numbers as compact ranges.
pub fn season_label(seasons: &[u32]) -> Option<String> {
    let (&head, rest) = seasons.split_first()?;

    let mut ranges: Vec<(u32, u32)> = vec![(head, head)];
    for &n in rest {
        match ranges.last_mut() {
            Some((_, end)) if n == *end + 1 => *end = n,
            _ => ranges.push((n, n)),
        }
    }

    let parts: Vec<String> = ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect();
    let prefix = if ranges.len() > 1 { "Seasons" } else { "Season" };
    Some(format!("{prefix} {}", parts.join(", ")))
}

fn strip_season_suffix(title: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with `title`.
    let lower = title.to_ascii_lowercase();
    match lower.rfind(" - season") {
        Some(idx) => title[..idx].trim_end(),
        None => title,
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
