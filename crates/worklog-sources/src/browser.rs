//! Chrome browser history adapter.
//!
//! Chrome keeps history in a SQLite file it holds locked while running, so
//! we copy it to a temp dir and read the copy. Visit times use the WebKit
//! epoch: microseconds since 1601-01-01.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use sqlx::{Row as _, SqlitePool};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use worklog_core::error::{Result, WorklogError};
use worklog_core::{Config, WorkRecord};

/// Seconds between the WebKit epoch (1601-01-01) and the unix epoch.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Path to the History database for a Chrome profile, per OS.
pub fn history_path(profile: &str) -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let base = if cfg!(target_os = "macos") {
        home.join("Library/Application Support/Google/Chrome")
    } else if cfg!(target_os = "windows") {
        home.join("AppData/Local/Google/Chrome/User Data")
    } else {
        home.join(".config/google-chrome")
    };
    base.join(profile).join("History")
}

/// Convert a WebKit timestamp to the user's local wall-clock time. Zero and
/// pre-unix-epoch values have no useful meaning and map to `None`.
pub fn webkit_to_naive(webkit_micros: i64) -> Option<NaiveDateTime> {
    webkit_to_naive_in(webkit_micros, &Local)
}

fn webkit_to_naive_in<Tz: TimeZone>(webkit_micros: i64, tz: &Tz) -> Option<NaiveDateTime> {
    if webkit_micros <= 0 {
        return None;
    }
    let secs = webkit_micros / 1_000_000 - WEBKIT_EPOCH_OFFSET_SECS;
    if secs < 0 {
        return None;
    }
    let micros = (webkit_micros % 1_000_000) as u32;
    DateTime::from_timestamp(secs, micros * 1_000).map(|dt| dt.with_timezone(tz).naive_local())
}

/// Convert a local wall-clock datetime to a WebKit timestamp.
pub fn naive_to_webkit(dt: NaiveDateTime) -> i64 {
    naive_to_webkit_in(dt, &Local)
}

fn naive_to_webkit_in<Tz: TimeZone>(dt: NaiveDateTime, tz: &Tz) -> i64 {
    // An ambiguous or skipped wall-clock time (DST transition) takes the
    // earliest valid instant.
    let unix_secs = tz
        .from_local_datetime(&dt)
        .earliest()
        .map(|t| t.timestamp())
        .unwrap_or_else(|| dt.and_utc().timestamp());
    (unix_secs + WEBKIT_EPOCH_OFFSET_SECS) * 1_000_000
        + i64::from(dt.and_utc().timestamp_subsec_micros())
}

/// Fetch browsing history between `start` and `end`.
pub async fn fetch(config: &Config, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<WorkRecord>> {
    let profile = config.chrome_profile.as_deref().unwrap_or("Default");
    let source_path = history_path(profile);

    if !source_path.exists() {
        return Err(WorklogError::Source {
            source_name: "browser",
            message: format!("Chrome history not found at {}", source_path.display()),
        });
    }

    let temp_dir = tempfile::tempdir()?;
    let temp_db = temp_dir.path().join("History");
    std::fs::copy(&source_path, &temp_db).map_err(|_| WorklogError::Source {
        source_name: "browser",
        message: "Cannot access Chrome history. Please close Chrome and try again.".into(),
    })?;

    read_history(&temp_db, start, end).await
}

/// Read visits from a history database copy, newest first.
pub async fn read_history(
    db_path: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<WorkRecord>> {
    let url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePool::connect(&url)
        .await
        .map_err(|e| source_error(e.to_string()))?;

    let rows = sqlx::query(
        "SELECT urls.url, urls.title, visits.visit_time
         FROM urls
         JOIN visits ON urls.id = visits.url
         WHERE visits.visit_time >= ? AND visits.visit_time <= ?
         ORDER BY visits.visit_time DESC",
    )
    .bind(naive_to_webkit(start))
    .bind(naive_to_webkit(end))
    .fetch_all(&pool)
    .await
    .map_err(|e| source_error(e.to_string()))?;

    pool.close().await;

    let mut records = Vec::new();
    for row in rows {
        let url: String = row.try_get("url").map_err(|e| source_error(e.to_string()))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| source_error(e.to_string()))?;
        let visit_time: i64 = row
            .try_get("visit_time")
            .map_err(|e| source_error(e.to_string()))?;

        // Internal pages and untitled visits carry no signal.
        if title.is_empty()
            || url.starts_with("chrome://")
            || url.starts_with("chrome-extension://")
        {
            continue;
        }

        let record = match webkit_to_naive(visit_time) {
            Some(ts) => WorkRecord::at(ts, title, url),
            None => WorkRecord::undated(title, url),
        };
        records.push(record);
    }

    Ok(records)
}

fn source_error(message: String) -> WorklogError {
    WorklogError::Source {
        source_name: "browser",
        message,
    }
}

/// Collapse repeat visits: keep the first record per lowercased title, up
/// to `cap` records.
pub fn dedup_by_title(records: &[WorkRecord], cap: usize) -> Vec<WorkRecord> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for record in records {
        if unique.len() >= cap {
            break;
        }
        if seen.insert(record.label.to_lowercase()) {
            unique.push(record.clone());
        }
    }
    unique
}

/// Whether the history file for the configured profile exists.
pub fn test_access(config: &Config) -> bool {
    let profile = config.chrome_profile.as_deref().unwrap_or("Default");
    history_path(profile).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_webkit_conversion_roundtrip() {
        let dt = ts(9, 30);
        let webkit = naive_to_webkit(dt);
        assert_eq!(webkit_to_naive(webkit), Some(dt));
    }

    #[test]
    fn test_webkit_conversion_uses_wall_clock_of_the_zone() {
        use chrono::FixedOffset;

        // 2026-03-13 20:30:00 UTC is 2026-03-14 02:00:00 in UTC+05:30.
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let stored = (1_773_433_800 + WEBKIT_EPOCH_OFFSET_SECS) * 1_000_000;
        let wall = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();

        assert_eq!(webkit_to_naive_in(stored, &ist), Some(wall));
        assert_eq!(naive_to_webkit_in(wall, &ist), stored);

        // The visit falls inside that zone's local day, even though the UTC
        // calendar date differs.
        let day_start = naive_to_webkit_in(ts(0, 0), &ist);
        let day_end = naive_to_webkit_in(ts(23, 59), &ist);
        assert!(day_start <= stored && stored <= day_end);
    }

    #[test]
    fn test_webkit_conversion_rejects_zero_and_pre_epoch() {
        assert_eq!(webkit_to_naive(0), None);
        assert_eq!(webkit_to_naive(-1), None);
        // One second after the WebKit epoch is centuries before unix time.
        assert_eq!(webkit_to_naive(1_000_000), None);
    }

    #[test]
    fn test_dedup_by_title() {
        let records = vec![
            WorkRecord::at(ts(10, 0), "Rust Docs", "https://doc.rust-lang.org/1"),
            WorkRecord::at(ts(9, 0), "rust docs", "https://doc.rust-lang.org/2"),
            WorkRecord::at(ts(8, 0), "Crates.io", "https://crates.io"),
        ];
        let unique = dedup_by_title(&records, 50);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].detail, "https://doc.rust-lang.org/1");

        let capped = dedup_by_title(&records, 1);
        assert_eq!(capped.len(), 1);
    }

    async fn build_fixture(db_path: &Path) {
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&url).await.unwrap();
        sqlx::query("CREATE TABLE urls (id INTEGER PRIMARY KEY, url TEXT, title TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE visits (id INTEGER PRIMARY KEY, url INTEGER, visit_time INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        let rows: &[(i64, &str, &str, NaiveDateTime)] = &[
            (1, "https://crates.io/crates/sqlx", "sqlx - crates.io", ts(9, 0)),
            (2, "https://docs.rs/tokio", "tokio - Rust", ts(11, 30)),
            (3, "chrome://settings", "Settings", ts(11, 45)),
            (4, "https://example.com", "", ts(12, 0)),
            (5, "https://github.com", "GitHub", ts(23, 0)),
        ];
        for (id, url, title, visited) in rows {
            sqlx::query("INSERT INTO urls (id, url, title) VALUES (?, ?, ?)")
                .bind(id)
                .bind(url)
                .bind(title)
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO visits (url, visit_time) VALUES (?, ?)")
                .bind(id)
                .bind(naive_to_webkit(*visited))
                .execute(&pool)
                .await
                .unwrap();
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_read_history_filters_range_and_junk() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("History");
        build_fixture(&db_path).await;

        // 09:00 through 12:00: includes sqlx and tokio, excludes the
        // chrome:// page, the untitled visit, and the 23:00 visit.
        let records = read_history(&db_path, ts(9, 0), ts(12, 0)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "tokio - Rust"); // newest first
        assert_eq!(records[1].label, "sqlx - crates.io");
        assert_eq!(records[1].time, "09:00");
    }

    #[tokio::test]
    async fn test_fetch_with_missing_history_file_is_source_error() {
        let mut config = Config::default();
        config.chrome_profile = Some("NoSuchProfileForTests".into());
        let err = fetch(&config, ts(0, 0), ts(23, 59)).await.unwrap_err();
        assert!(matches!(err, WorklogError::Source { source_name: "browser", .. }));
    }
}
