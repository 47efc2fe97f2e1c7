use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{info, warn};

use crate::mood_entry::{Mood, MoodEntry, TIMESTAMP_FORMAT};
use crate::sheet::{Record, SheetClient, MOOD_COLUMN, TIMESTAMP_COLUMN};

/// Wall-clock interval between automatic re-reads of the remote store.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);
/// How many entries the recent-log table shows.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("record is missing the Timestamp column")]
    MissingTimestamp,
    #[error("unparseable timestamp {0:?}")]
    BadTimestamp(String),
}

/// Same-day mood distribution, or the not-an-error empty states.
#[derive(Debug, PartialEq, Eq)]
pub enum DailySummary {
    /// No rows at all, none for the selected date, or no Mood column.
    NoData,
    Counts(Vec<MoodCount>),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MoodCount {
    pub mood: String,
    pub count: u64,
}

/// Everything one render cycle needs: the store handle, the cached record
/// set, the selected date, and the current status messages.
pub struct Dashboard {
    client: SheetClient,
    records: Vec<Record>,
    pub selected_date: NaiveDate,
    pub flash: Option<String>,
    pub remote_error: Option<String>,
    last_refresh: Instant,
}

impl Dashboard {
    pub fn new(client: SheetClient) -> Self {
        Dashboard {
            client,
            records: Vec::new(),
            selected_date: Local::now().date_naive(),
            flash: None,
            remote_error: None,
            last_refresh: Instant::now(),
        }
    }

    /// Re-reads the entire remote table. On failure the previous records are
    /// kept and the error is held for inline display.
    pub fn reload(&mut self) {
        self.last_refresh = Instant::now();
        match self.client.read_all() {
            Ok(records) => {
                info!(count = records.len(), "reloaded records from remote store");
                self.records = records;
                self.remote_error = None;
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.remote_error = Some(e.to_string());
            }
        }
    }

    /// Reloads once the refresh interval has elapsed. Success flashes from an
    /// earlier submission lapse with the timed refresh, like any other rerun.
    pub fn tick(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.flash = None;
            self.reload();
        }
    }

    /// Stamps and appends one entry, then re-reads so the new row shows up
    /// immediately. Every call writes a distinct row.
    pub fn submit(&mut self, mood: Mood, note: String) {
        let entry = MoodEntry::now(mood, note);
        match self.client.append(&entry.row()) {
            Ok(()) => {
                info!(mood = mood.tag(), "logged mood");
                self.reload();
                self.flash = Some(format!("✅ Mood {} logged!", mood.label()));
            }
            Err(e) => {
                warn!(error = %e, "append failed");
                self.remote_error = Some(e.to_string());
            }
        }
    }

    pub fn prev_day(&mut self) {
        if let Some(date) = self.selected_date.pred_opt() {
            self.selected_date = date;
            self.reload();
        }
    }

    pub fn next_day(&mut self) {
        if let Some(date) = self.selected_date.succ_opt() {
            self.selected_date = date;
            self.reload();
        }
    }

    pub fn today(&mut self) {
        self.selected_date = Local::now().date_naive();
        self.reload();
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> Result<DailySummary, SummaryError> {
        summarize(&self.records, self.selected_date)
    }

    pub fn recent(&self) -> Vec<&Record> {
        recent_logs(&self.records, RECENT_LIMIT)
    }
}

/// Filters to the selected date and counts entries per mood tag, most
/// frequent first, ties in first-seen order.
///
/// Any record with a missing or unparseable Timestamp fails the whole
/// aggregation for this render cycle; bad rows are deliberately not skipped.
pub fn summarize(records: &[Record], date: NaiveDate) -> Result<DailySummary, SummaryError> {
    if records.is_empty() {
        return Ok(DailySummary::NoData);
    }

    let mut matching = Vec::new();
    for record in records {
        let raw = record
            .get(TIMESTAMP_COLUMN)
            .ok_or(SummaryError::MissingTimestamp)?;
        let parsed = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map_err(|_| SummaryError::BadTimestamp(raw.clone()))?;
        if parsed.date() == date {
            matching.push(record);
        }
    }
    if matching.is_empty() {
        return Ok(DailySummary::NoData);
    }

    let mut counts: Vec<MoodCount> = Vec::new();
    for record in matching {
        let Some(tag) = record.get(MOOD_COLUMN) else {
            return Ok(DailySummary::NoData);
        };
        match counts.iter_mut().find(|c| c.mood == *tag) {
            Some(existing) => existing.count += 1,
            None => counts.push(MoodCount {
                mood: tag.clone(),
                count: 1,
            }),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(DailySummary::Counts(counts))
}

/// Most recent entries first. The timestamp format is fixed-width, so a
/// lexicographic sort on the raw cell is chronological and never needs to
/// parse; rows the summary rejects still show up here.
pub fn recent_logs(records: &[Record], limit: usize) -> Vec<&Record> {
    let mut rows: Vec<&Record> = records.iter().collect();
    rows.sort_by(|a, b| {
        let ta = a.get(TIMESTAMP_COLUMN).map(String::as_str).unwrap_or("");
        let tb = b.get(TIMESTAMP_COLUMN).map(String::as_str).unwrap_or("");
        tb.cmp(ta)
    });
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str, mood: &str, note: &str) -> Record {
        Record::from([
            (TIMESTAMP_COLUMN.to_string(), timestamp.to_string()),
            (MOOD_COLUMN.to_string(), mood.to_string()),
            ("Note".to_string(), note.to_string()),
        ])
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn counts_grouped_by_tag_most_frequent_first() {
        let records = vec![
            record("2024-05-01 09:00:00", "😠", ""),
            record("2024-05-01 10:00:00", "😊", ""),
            record("2024-05-01 11:00:00", "😊", ""),
        ];
        let summary = summarize(&records, day()).unwrap();
        assert_eq!(
            summary,
            DailySummary::Counts(vec![
                MoodCount { mood: "😊".to_string(), count: 2 },
                MoodCount { mood: "😠".to_string(), count: 1 },
            ])
        );
    }

    #[test]
    fn equal_counts_keep_first_seen_order() {
        let records = vec![
            record("2024-05-01 09:00:00", "🎉", ""),
            record("2024-05-01 10:00:00", "😐", ""),
            record("2024-05-01 11:00:00", "🎉", ""),
            record("2024-05-01 12:00:00", "😐", ""),
        ];
        let DailySummary::Counts(counts) = summarize(&records, day()).unwrap() else {
            panic!("expected counts");
        };
        assert_eq!(counts[0].mood, "🎉");
        assert_eq!(counts[1].mood, "😐");
    }

    #[test]
    fn date_without_entries_is_no_data_not_an_error() {
        let records = vec![record("2024-05-01 09:00:00", "😊", "")];
        let other_day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(summarize(&records, other_day), Ok(DailySummary::NoData));
    }

    #[test]
    fn empty_store_is_no_data() {
        assert_eq!(summarize(&[], day()), Ok(DailySummary::NoData));
    }

    #[test]
    fn missing_mood_column_is_no_data() {
        let mut bare = Record::new();
        bare.insert(TIMESTAMP_COLUMN.to_string(), "2024-05-01 09:00:00".to_string());
        assert_eq!(summarize(&[bare], day()), Ok(DailySummary::NoData));
    }

    #[test]
    fn unparseable_timestamp_fails_the_whole_summary() {
        let records = vec![
            record("2024-05-01 09:00:00", "😊", ""),
            record("yesterday-ish", "😠", ""),
        ];
        assert_eq!(
            summarize(&records, day()),
            Err(SummaryError::BadTimestamp("yesterday-ish".to_string()))
        );
    }

    #[test]
    fn missing_timestamp_column_fails_the_summary() {
        let mut bare = Record::new();
        bare.insert(MOOD_COLUMN.to_string(), "😊".to_string());
        assert_eq!(summarize(&[bare], day()), Err(SummaryError::MissingTimestamp));
    }

    #[test]
    fn recent_logs_take_newest_five() {
        let records: Vec<Record> = (1..=7)
            .map(|hour| record(&format!("2024-05-01 {hour:02}:00:00"), "😊", ""))
            .collect();
        let recent = recent_logs(&records, RECENT_LIMIT);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0][TIMESTAMP_COLUMN], "2024-05-01 07:00:00");
        assert_eq!(recent[4][TIMESTAMP_COLUMN], "2024-05-01 03:00:00");
    }

    #[test]
    fn recent_logs_survive_timestamps_the_summary_rejects() {
        let records = vec![
            record("not a timestamp", "😕", ""),
            record("2024-05-01 09:00:00", "😊", ""),
        ];
        assert!(summarize(&records, day()).is_err());
        assert_eq!(recent_logs(&records, RECENT_LIMIT).len(), 2);
    }

    #[test]
    fn recent_logs_of_empty_store_are_empty() {
        assert!(recent_logs(&[], RECENT_LIMIT).is_empty());
    }
}
