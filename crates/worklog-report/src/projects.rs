//! Project listing rendering: projects grouped by state, sorted by last
//! health update.

use crate::table::{Table, BOLD, CYAN, DIM, GREEN, RED, RESET, YELLOW};
use chrono::{Local, NaiveDateTime};
use worklog_sources::linear::Project;

/// Display order and headings per project state.
const STATE_GROUPS: &[(&str, &str, &str)] = &[
    ("started", "🚀", "In Progress"),
    ("planned", "📋", "Planned / Todo"),
    ("backlog", "📦", "Backlog"),
    ("paused", "⏸", "Paused"),
];

const CLOSED_GROUPS: &[(&str, &str, &str)] =
    &[("completed", "✅", "Completed"), ("canceled", "❌", "Canceled")];

/// Render projects grouped by state. Closed groups only appear with
/// `show_all`.
pub fn render_projects(projects: &[Project], show_all: bool) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "{BOLD}{CYAN}Projects{RESET}\n{DIM}Sorted by last health update{RESET}\n\n"
    ));

    if projects.is_empty() {
        out.push_str(&format!("{DIM}No projects found.{RESET}\n"));
        return out;
    }

    let groups: Vec<_> = if show_all {
        STATE_GROUPS.iter().chain(CLOSED_GROUPS).collect()
    } else {
        STATE_GROUPS.iter().collect()
    };
    // Unknown states land in the backlog group rather than disappearing.
    let known_states: Vec<&str> = STATE_GROUPS
        .iter()
        .chain(CLOSED_GROUPS)
        .map(|(state, _, _)| *state)
        .collect();

    let mut total = 0;
    for (state, icon, title) in groups {
        let mut in_state: Vec<&Project> = projects
            .iter()
            .filter(|p| {
                p.state == *state || (*state == "backlog" && !known_states.contains(&p.state.as_str()))
            })
            .collect();
        if in_state.is_empty() {
            continue;
        }
        in_state.sort_by(|a, b| b.health_updated_at.cmp(&a.health_updated_at));
        total += in_state.len();

        out.push_str(&format!(
            "{BOLD}{icon} {title} ({}){RESET}\n",
            in_state.len()
        ));

        let mut table = Table::new()
            .column_with("Project", 40, "")
            .column_with("Health", 12, "")
            .column_with("Progress", 8, CYAN)
            .column_with("Lead", 16, YELLOW)
            .column_with("Target", 20, GREEN)
            .column_with("Updated", 12, DIM);

        for project in in_state {
            table.add_row(vec![
                project.name.clone(),
                health_label(project.health.as_deref()),
                progress_label(project.progress),
                project.lead.clone().unwrap_or_else(|| "-".into()),
                target_label(project.target_date.as_deref(), &project.state),
                project
                    .health_updated_at
                    .map(relative_time)
                    .unwrap_or_else(|| "-".into()),
            ]);
        }
        out.push_str(&table.render());
        out.push('\n');
    }

    out.push_str(&format!("{DIM}Total: {total} projects{RESET}\n"));
    out
}

fn health_label(health: Option<&str>) -> String {
    match health {
        Some("onTrack") => "🟢 On Track".into(),
        Some("atRisk") => "🟡 At Risk".into(),
        Some("offTrack") => "🔴 Off Track".into(),
        Some(other) => format!("⚪ {other}"),
        None => "-".into(),
    }
}

fn progress_label(progress: Option<f64>) -> String {
    match progress {
        Some(p) => format!("{}%", (p * 100.0).round() as i64),
        None => "-".into(),
    }
}

/// Target dates in the past are flagged for any state that isn't done.
fn target_label(target: Option<&str>, state: &str) -> String {
    let Some(target) = target else {
        return "-".into();
    };
    let date_part: String = target.chars().take(10).collect();
    let overdue = chrono::NaiveDate::parse_from_str(&date_part, "%Y-%m-%d")
        .map(|d| d < Local::now().date_naive() && state != "completed")
        .unwrap_or(false);
    if overdue {
        format!("{RED}{date_part} (overdue){RESET}")
    } else {
        date_part
    }
}

/// "3h ago", "yesterday", "2w ago" style relative times.
pub fn relative_time(then: NaiveDateTime) -> String {
    let now = Local::now().naive_local();
    let diff = now - then;
    let days = diff.num_days();

    if days == 0 {
        let hours = diff.num_hours();
        if hours == 0 {
            let minutes = diff.num_minutes();
            return if minutes > 0 {
                format!("{minutes}m ago")
            } else {
                "just now".into()
            };
        }
        format!("{hours}h ago")
    } else if days == 1 {
        "yesterday".into()
    } else if days < 7 {
        format!("{days}d ago")
    } else if days < 30 {
        format!("{}w ago", days / 7)
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn project(name: &str, state: &str) -> Project {
        Project {
            name: name.into(),
            state: state.into(),
            progress: Some(0.42),
            target_date: Some("2026-06-30".into()),
            lead: Some("Sam".into()),
            health: Some("onTrack".into()),
            health_updated_at: Some(Local::now().naive_local() - Duration::days(2)),
            teams: vec!["ENG".into()],
        }
    }

    #[test]
    fn test_groups_and_totals() {
        let projects = vec![
            project("Alpha", "started"),
            project("Beta", "backlog"),
            project("Gamma", "completed"),
        ];

        let rendered = render_projects(&projects, false);
        assert!(rendered.contains("In Progress (1)"));
        assert!(rendered.contains("Backlog (1)"));
        assert!(!rendered.contains("Gamma"));
        assert!(rendered.contains("Total: 2 projects"));

        let all = render_projects(&projects, true);
        assert!(all.contains("Gamma"));
        assert!(all.contains("Total: 3 projects"));
    }

    #[test]
    fn test_unknown_state_falls_back_to_backlog() {
        let rendered = render_projects(&[project("Mystery", "someNewState")], false);
        assert!(rendered.contains("Backlog (1)"));
        assert!(rendered.contains("Mystery"));
    }

    #[test]
    fn test_progress_and_health_labels() {
        assert_eq!(progress_label(Some(0.42)), "42%");
        assert_eq!(progress_label(None), "-");
        assert_eq!(health_label(Some("atRisk")), "🟡 At Risk");
        assert_eq!(health_label(None), "-");
    }

    #[test]
    fn test_overdue_target_is_flagged() {
        let overdue = target_label(Some("2020-01-01"), "started");
        assert!(overdue.contains("overdue"));
        let done = target_label(Some("2020-01-01"), "completed");
        assert!(!done.contains("overdue"));
        let future = target_label(Some("2999-01-01"), "started");
        assert_eq!(future, "2999-01-01");
    }

    #[test]
    fn test_relative_time() {
        let now = Local::now().naive_local();
        assert_eq!(relative_time(now), "just now");
        assert_eq!(relative_time(now - Duration::hours(3)), "3h ago");
        assert_eq!(relative_time(now - Duration::days(1)), "yesterday");
        assert_eq!(relative_time(now - Duration::days(10)), "1w ago");
        assert_eq!(relative_time(now - Duration::days(400)), "1y ago");
    }
}
