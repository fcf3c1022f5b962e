//! # Repository Status
//!
//! [`RepositoryStatus`] is the outcome record of one repository job. It is
//! owned by exactly one job while that job runs and is handed back to the
//! orchestrator through the scheduler's join, so there is never more than one
//! writer. Flags only ever go from `false` to `true` during a run.
//!
//! [`render_table`] turns the per-repository rows of a finished batch into the
//! summary printed after `get --status`.

use console::Style;

use crate::output::OutputConfig;

/// Outcome flags of a single repository job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStatus {
    processed: bool,
    not_on_ref_branch: bool,
    uncommitted_changes: bool,
    error: bool,
}

impl RepositoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> bool {
        self.processed
    }

    pub fn not_on_ref_branch(&self) -> bool {
        self.not_on_ref_branch
    }

    pub fn uncommitted_changes(&self) -> bool {
        self.uncommitted_changes
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn mark_processed(&mut self) {
        self.processed = true;
    }

    pub fn mark_not_on_ref_branch(&mut self) {
        self.not_on_ref_branch = true;
    }

    pub fn mark_uncommitted_changes(&mut self) {
        self.uncommitted_changes = true;
    }

    pub fn mark_error(&mut self) {
        self.error = true;
    }

    /// True when the job ran and raised none of the attention flags.
    pub fn is_clean(&self) -> bool {
        self.processed && !self.not_on_ref_branch && !self.uncommitted_changes && !self.error
    }
}

/// One line of the status summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub url: String,
    /// Where the repository ended up: its full path in get mode, its
    /// destination URL in mirror mode. `None` for skipped repositories.
    pub location: Option<String>,
    pub status: RepositoryStatus,
    pub skipped: bool,
}

impl StatusRow {
    /// Row for a repository excluded by the ignore filter.
    pub fn skipped(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            location: None,
            status: RepositoryStatus::new(),
            skipped: true,
        }
    }

    /// Row for a repository a job ran for.
    pub fn finished(
        url: impl Into<String>,
        location: impl Into<String>,
        status: RepositoryStatus,
    ) -> Self {
        Self {
            url: url.into(),
            location: Some(location.into()),
            status,
            skipped: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.skipped && self.status.is_clean()
    }
}

/// Counts of a finished batch, used for the closing log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub skipped: usize,
    pub errors: usize,
    pub clean: usize,
}

impl Summary {
    pub fn of(rows: &[StatusRow]) -> Self {
        Self {
            total: rows.len(),
            skipped: rows.iter().filter(|r| r.skipped).count(),
            errors: rows.iter().filter(|r| r.status.error()).count(),
            clean: rows.iter().filter(|r| r.is_clean()).count(),
        }
    }
}

const HEADERS: [&str; 7] = [
    "REPOSITORY",
    "PATH",
    "LOCAL_CHANGES",
    "NOT_ON_REF",
    "ERROR",
    "SKIPPED",
    "CLEAN",
];

const PLACEHOLDER: &str = "-";

fn cells(row: &StatusRow) -> [String; 7] {
    let flag = |value: bool| value.to_string();
    if row.skipped {
        return [
            row.url.clone(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            flag(true),
            flag(false),
        ];
    }
    [
        row.url.clone(),
        row.location
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        flag(row.status.uncommitted_changes()),
        flag(row.status.not_on_ref_branch()),
        flag(row.status.error()),
        flag(false),
        flag(row.is_clean()),
    ]
}

/// Renders the status summary as an aligned table.
///
/// With colour enabled, raised attention flags are red, skipped markers
/// yellow and clean markers green.
pub fn render_table(rows: &[StatusRow], output: &OutputConfig) -> String {
    let table: Vec<[String; 7]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(str::len);
    for line in &table {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let alert = styled(output, Style::new().red());
    let skipped = styled(output, Style::new().yellow());
    let clean = styled(output, Style::new().green());
    let header = styled(output, Style::new().bold());

    let mut rendered = String::new();
    let header_line: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| header.apply_to(format!("{:<width$}", h, width = *w)).to_string())
        .collect();
    rendered.push_str(header_line.join("  ").trim_end());
    rendered.push('\n');

    for line in &table {
        let mut parts = Vec::with_capacity(line.len());
        for (column, (cell, width)) in line.iter().zip(widths.iter()).enumerate() {
            let padded = format!("{:<width$}", cell, width = *width);
            let part = match (column, cell.as_str()) {
                (2..=4, "true") => alert.apply_to(padded).to_string(),
                (5, "true") => skipped.apply_to(padded).to_string(),
                (6, "true") => clean.apply_to(padded).to_string(),
                _ => padded,
            };
            parts.push(part);
        }
        rendered.push_str(parts.join("  ").trim_end());
        rendered.push('\n');
    }

    rendered
}

fn styled(output: &OutputConfig, style: Style) -> Style {
    if output.use_color {
        style.force_styling(true)
    } else {
        Style::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirty_status() -> RepositoryStatus {
        let mut status = RepositoryStatus::new();
        status.mark_uncommitted_changes();
        status.mark_processed();
        status
    }

    #[test]
    fn test_new_status_is_unprocessed() {
        let status = RepositoryStatus::new();
        assert!(!status.processed());
        assert!(!status.is_clean());
    }

    #[test]
    fn test_flags_are_monotonic() {
        let mut status = RepositoryStatus::new();
        status.mark_error();
        status.mark_error();
        assert!(status.error());
        status.mark_not_on_ref_branch();
        assert!(status.error());
        assert!(status.not_on_ref_branch());
    }

    #[test]
    fn test_clean_requires_processed_and_no_flags() {
        let mut status = RepositoryStatus::new();
        status.mark_processed();
        assert!(status.is_clean());
        status.mark_not_on_ref_branch();
        assert!(!status.is_clean());
    }

    #[test]
    fn test_skipped_row_is_never_clean() {
        let row = StatusRow::skipped("git@host:a/b.git");
        assert!(row.skipped);
        assert!(!row.is_clean());
        assert!(!row.status.processed());
    }

    #[test]
    fn test_summary_counts() {
        let mut errored = RepositoryStatus::new();
        errored.mark_error();
        errored.mark_processed();
        let mut clean = RepositoryStatus::new();
        clean.mark_processed();

        let rows = vec![
            StatusRow::finished("a", "/w/a", errored),
            StatusRow::finished("b", "/w/b", clean),
            StatusRow::skipped("c"),
        ];
        let summary = Summary::of(&rows);
        assert_eq!(
            summary,
            Summary {
                total: 3,
                skipped: 1,
                errors: 1,
                clean: 1
            }
        );
    }

    #[test]
    fn test_render_table_plain() {
        let rows = vec![
            StatusRow::finished("git@host:a/b.git", "/w/b", dirty_status()),
            StatusRow::skipped("git@host:a/c.git"),
        ];
        let table = render_table(&rows, &OutputConfig::without_color());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);

        let header: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(header, HEADERS.to_vec());

        let processed: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(
            processed,
            vec!["git@host:a/b.git", "/w/b", "true", "false", "false", "false", "false"]
        );

        let skipped: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(
            skipped,
            vec!["git@host:a/c.git", "-", "-", "-", "-", "true", "false"]
        );
    }

    #[test]
    fn test_render_table_columns_are_aligned() {
        let rows = vec![
            StatusRow::finished("short", "/a", dirty_status()),
            StatusRow::finished(
                "a-much-longer-repository-url",
                "/some/longer/path",
                dirty_status(),
            ),
        ];
        let table = render_table(&rows, &OutputConfig::without_color());
        let offsets: Vec<usize> = table
            .lines()
            .map(|line| line.find("LOCAL_CHANGES").or_else(|| line.find("true")).unwrap())
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_render_table_colored_contains_ansi() {
        let rows = vec![StatusRow::finished("a", "/a", dirty_status())];
        let table = render_table(&rows, &OutputConfig::with_color());
        assert!(table.contains("\u{1b}["));
    }
}
