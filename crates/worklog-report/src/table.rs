//! Minimal ANSI table renderer.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const YELLOW: &str = "\x1b[0;33m";
pub const BLUE: &str = "\x1b[0;34m";
pub const MAGENTA: &str = "\x1b[0;35m";
pub const CYAN: &str = "\x1b[0;36m";

struct Column {
    header: String,
    /// Maximum content width; longer cells are truncated with an ellipsis.
    max_width: Option<usize>,
    color: Option<&'static str>,
}

/// A rounded-box table. Column widths adapt to content up to each column's
/// cap; colors wrap the padded cell so they never skew the layout.
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, header: impl Into<String>) -> Self {
        self.columns.push(Column {
            header: header.into(),
            max_width: None,
            color: None,
        });
        self
    }

    pub fn column_with(
        mut self,
        header: impl Into<String>,
        max_width: usize,
        color: &'static str,
    ) -> Self {
        self.columns.push(Column {
            header: header.into(),
            max_width: Some(max_width),
            color: (!color.is_empty()).then_some(color),
        });
        self
    }

    pub fn add_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let content_max = self
                    .rows
                    .iter()
                    .map(|r| r.get(i).map(|c| c.chars().count()).unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                let wanted = content_max.max(col.header.chars().count());
                match col.max_width {
                    Some(cap) => wanted.min(cap),
                    None => wanted,
                }
            })
            .collect();

        let mut out = String::new();
        out.push_str(&self.border(&widths, '╭', '┬', '╮'));

        // Header row.
        out.push('│');
        for (col, width) in self.columns.iter().zip(&widths) {
            out.push_str(&format!(
                " {}{}{} │",
                BOLD,
                pad(&col.header, *width),
                RESET
            ));
        }
        out.push('\n');
        out.push_str(&self.border(&widths, '├', '┼', '┤'));

        for row in &self.rows {
            out.push('│');
            for (i, (col, width)) in self.columns.iter().zip(&widths).enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let padded = pad(cell, *width);
                match col.color {
                    Some(color) => out.push_str(&format!(" {color}{padded}{RESET} │")),
                    None => out.push_str(&format!(" {padded} │")),
                }
            }
            out.push('\n');
        }

        out.push_str(&self.border(&widths, '╰', '┴', '╯'));
        out
    }

    fn border(&self, widths: &[usize], left: char, mid: char, right: char) -> String {
        let mut line = String::new();
        line.push(left);
        for (i, width) in widths.iter().enumerate() {
            line.push_str(&"─".repeat(width + 2));
            line.push(if i + 1 == widths.len() { right } else { mid });
        }
        line.push('\n');
        line
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate to `width` chars (ellipsis when cut) and right-pad with spaces.
pub fn pad(text: &str, width: usize) -> String {
    let truncated = truncate(text, width);
    let len = truncated.chars().count();
    format!("{}{}", truncated, " ".repeat(width.saturating_sub(len)))
}

pub fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let cut: String = text.chars().take(width - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 2), "he");
    }

    #[test]
    fn test_pad_accounts_for_chars_not_bytes() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("héllo", 5).chars().count(), 5);
    }

    #[test]
    fn test_render_shape() {
        let mut table = Table::new()
            .column_with("Time", 12, CYAN)
            .column("Event");
        table.add_row(vec!["09:00".into(), "Standup".into()]);
        table.add_row(vec!["10:00".into(), "Design review".into()]);

        let rendered = table.render();
        assert!(rendered.starts_with('╭'));
        assert!(rendered.trim_end().ends_with('╯'));
        assert!(rendered.contains("Standup"));
        // header + separator + 2 rows + 2 borders
        assert_eq!(rendered.trim_end().lines().count(), 6);
    }

    #[test]
    fn test_long_cells_are_capped() {
        let mut table = Table::new().column_with("URL", 10, DIM);
        table.add_row(vec!["https://example.com/a/very/long/path".into()]);
        let rendered = table.render();
        assert!(rendered.contains("https:/..."));
        assert!(!rendered.contains("long/path"));
    }
}
