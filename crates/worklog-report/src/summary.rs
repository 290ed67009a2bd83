//! Day and range summary rendering.

use crate::table::{Table, BLUE, BOLD, CYAN, DIM, GREEN, MAGENTA, RED, RESET, YELLOW};
use chrono::NaiveDate;
use worklog_core::{Source, WorkRecord};
use worklog_sources::browser::dedup_by_title;
use worklog_sources::DayData;

const DAY_BROWSER_CAP: usize = 20;
const RANGE_BROWSER_CAP: usize = 30;

/// Render a single-day summary.
pub fn render_day(date: NaiveDate, data: &DayData) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&panel(&format!(
        "Work Summary for {}",
        date.format("%A, %B %d, %Y")
    )));
    out.push('\n');
    render_sections(&mut out, data, false);
    out
}

/// Render a summary over a date range (week/month).
pub fn render_range(title: &str, start: NaiveDate, end: NaiveDate, data: &DayData) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&panel(title));
    out.push_str(&format!(
        "{DIM}{} to {}{RESET}\n\n",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    ));
    render_sections(&mut out, data, true);
    out
}

/// Double-line box around a bold cyan title.
fn panel(title: &str) -> String {
    let width = title.chars().count() + 2;
    format!(
        "╔{line}╗\n║ {BOLD}{CYAN}{title}{RESET} ║\n╚{line}╝\n",
        line = "═".repeat(width),
    )
}

fn render_sections(out: &mut String, data: &DayData, with_date: bool) {
    let browser_cap = if with_date {
        RANGE_BROWSER_CAP
    } else {
        DAY_BROWSER_CAP
    };

    for source in data.requested() {
        let (icon, color, title) = section_heading(source);
        out.push_str(&format!("{BOLD}{color}{icon} {title}{RESET}\n"));

        if let Some(error) = data.error(source) {
            out.push_str(&format!("  {YELLOW}⚠ {error}{RESET}\n\n"));
            continue;
        }

        let records = data.records(source);
        if records.is_empty() {
            out.push_str(&format!(
                "  {DIM}No {} found{RESET}\n\n",
                title.to_lowercase()
            ));
            continue;
        }

        match source {
            Source::Browser => render_browser(out, records, browser_cap, with_date),
            Source::Commits => render_commits(out, records, with_date),
            _ => render_generic(out, records, source, with_date),
        }
        out.push('\n');
    }

    render_stats(out, data);
}

fn section_heading(source: Source) -> (&'static str, &'static str, &'static str) {
    match source {
        Source::Calendar => ("📅", MAGENTA, "Calendar Events"),
        Source::Browser => ("🔍", BLUE, "Browser History"),
        Source::Commits => ("💻", GREEN, "Commits"),
        Source::Chat => ("💬", CYAN, "Chat Messages"),
        Source::Issues => ("📝", YELLOW, "Issues"),
    }
}

fn render_generic(out: &mut String, records: &[WorkRecord], source: Source, with_date: bool) {
    let (label_header, detail_header) = match source {
        Source::Calendar => ("Event", "Duration"),
        Source::Chat => ("Channel", "Message"),
        Source::Issues => ("Issue", "State"),
        _ => ("Label", "Detail"),
    };

    let mut table = Table::new();
    if with_date {
        table = table.column_with("Date", 12, CYAN);
    }
    table = table
        .column_with("Time", 15, CYAN)
        .column_with(label_header, 40, "")
        .column_with(detail_header, 60, "");

    for record in records {
        let mut row = Vec::new();
        if with_date {
            row.push(record.date.clone());
        }
        row.extend([
            record.time.clone(),
            record.label.clone(),
            record.detail.clone(),
        ]);
        table.add_row(row);
    }
    out.push_str(&table.render());
}

fn render_browser(out: &mut String, records: &[WorkRecord], cap: usize, with_date: bool) {
    let unique = dedup_by_title(records, cap);

    let mut table = Table::new();
    if with_date {
        table = table.column_with("Date", 12, CYAN);
    }
    table = table
        .column_with("Time", 8, CYAN)
        .column_with("Page Title", 50, "")
        .column_with("URL", 40, DIM);

    for record in &unique {
        let mut row = Vec::new();
        if with_date {
            row.push(record.date.clone());
        }
        row.extend([
            record.time.clone(),
            record.label.clone(),
            record.detail.clone(),
        ]);
        table.add_row(row);
    }
    out.push_str(&table.render());

    if records.len() > cap {
        out.push_str(&format!(
            "  {DIM}... and {} more entries{RESET}\n",
            records.len() - cap
        ));
    }
}

fn render_commits(out: &mut String, records: &[WorkRecord], with_date: bool) {
    let mut table = Table::new();
    if with_date {
        table = table.column_with("Date", 12, CYAN);
    }
    table = table
        .column_with("Time", 8, CYAN)
        .column_with("Repository", 25, YELLOW)
        .column_with("Commit Message", 60, "")
        .column_with("Changes", 15, GREEN);

    for record in records {
        let changes = record
            .stats
            .map(|s| s.changes())
            .unwrap_or_else(|| "N/A".into());
        let mut row = Vec::new();
        if with_date {
            row.push(record.date.clone());
        }
        row.extend([
            record.time.clone(),
            record.label.clone(),
            record.detail.clone(),
            changes,
        ]);
        table.add_row(row);
    }
    out.push_str(&table.render());
}

fn render_stats(out: &mut String, data: &DayData) {
    out.push_str(&format!("{BOLD}{YELLOW}📊 Summary{RESET}\n"));

    for source in data.requested() {
        let (_, _, title) = section_heading(source);
        let count = match data.error(source) {
            Some(_) => format!("{RED}failed{RESET}"),
            None => data.records(source).len().to_string(),
        };
        out.push_str(&format!("  {BOLD}{title}{RESET}: {CYAN}{count}{RESET}\n"));
    }

    let commits = data.records(Source::Commits);
    if !commits.is_empty() {
        let additions: u32 = commits.iter().filter_map(|c| c.stats).map(|s| s.additions).sum();
        let deletions: u32 = commits.iter().filter_map(|c| c.stats).map(|s| s.deletions).sum();
        out.push_str(&format!(
            "  {BOLD}Lines added{RESET}: {GREEN}+{additions}{RESET}\n"
        ));
        out.push_str(&format!(
            "  {BOLD}Lines deleted{RESET}: {RED}-{deletions}{RESET}\n"
        ));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use worklog_sources::aggregate::DayData;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_day_summary_renders_sections_and_stats() {
        let data = DayData {
            calendar: Some(Ok(vec![WorkRecord::at(ts(9, 0), "Standup", "15m")])),
            commits: Some(Ok(vec![
                WorkRecord::at(ts(11, 0), "acme/widgets", "Fix cache").with_stats(10, 2),
            ])),
            ..DayData::default()
        };

        let rendered = render_day(date(), &data);
        assert!(rendered.contains("Work Summary for Saturday, March 14, 2026"));
        assert!(rendered.contains("Calendar Events"));
        assert!(rendered.contains("Standup"));
        assert!(rendered.contains("+10/-2"));
        assert!(rendered.contains("Lines added"));
    }

    #[test]
    fn test_error_slot_renders_warning_not_table() {
        let data = DayData {
            commits: Some(Err("API returned HTTP 401".into())),
            ..DayData::default()
        };
        let rendered = render_day(date(), &data);
        assert!(rendered.contains("⚠ API returned HTTP 401"));
        assert!(rendered.contains("failed"));
    }

    #[test]
    fn test_empty_section_message() {
        let data = DayData {
            chat: Some(Ok(vec![])),
            ..DayData::default()
        };
        let rendered = render_day(date(), &data);
        assert!(rendered.contains("No chat messages found"));
    }

    #[test]
    fn test_browser_truncation_footer() {
        let records: Vec<WorkRecord> = (0..25)
            .map(|i| WorkRecord::at(ts(9, 0), format!("Page {i}"), format!("https://x.test/{i}")))
            .collect();
        let data = DayData {
            browser: Some(Ok(records)),
            ..DayData::default()
        };

        let rendered = render_day(date(), &data);
        assert!(rendered.contains("... and 5 more entries"));
        assert!(rendered.contains("Page 19"));
        assert!(!rendered.contains("Page 20 ")); // capped at 20 rows
    }

    #[test]
    fn test_range_summary_has_date_column() {
        let data = DayData {
            calendar: Some(Ok(vec![WorkRecord::at(ts(9, 0), "Standup", "15m")])),
            ..DayData::default()
        };
        let rendered = render_range(
            "Week 11 Summary",
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        &data);
        assert!(rendered.contains("2026-03-09 to 2026-03-15"));
        assert!(rendered.contains("Date"));
        assert!(rendered.contains("2026-03-14"));
    }
}
