//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{ExperimentKind, ResultTable, RowError};

/// Maximum width of a single column in terminal output.
const MAX_COLUMN_WIDTH: usize = 96;

/// Full report for one experiment: banner, skipped rows and every table.
pub fn format_report(
    kind: ExperimentKind,
    label: Option<&str>,
    row_errors: &[RowError],
    tables: &[ResultTable],
) -> String {
    let mut out = String::new();

    match label {
        Some(label) => out.push_str(&format!("=== labfit - {} ({label}) ===\n", kind.display_name())),
        None => out.push_str(&format!("=== labfit - {} ===\n", kind.display_name())),
    }

    if !row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", row_errors.len()));
        for e in row_errors {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
    }

    for table in tables {
        out.push('\n');
        out.push_str(&format_table(table));
    }

    out
}

/// Fixed-width rendering of a table: title, header, dashed rule, rows.
pub fn format_table(table: &ResultTable) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.display()).collect())
        .collect();

    let n_cols = table.headers.len().max(cells.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; n_cols];
    for (i, h) in table.headers.iter().enumerate() {
        widths[i] = widths[i].max(h.chars().count());
    }
    for row in &cells {
        for (i, c) in row.iter().enumerate() {
            widths[i] = widths[i].max(c.chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let mut out = String::new();
    out.push_str(&table.title);
    out.push_str(":\n");

    out.push_str(&format_row(&table.headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row(&rule, &widths));
    for row in &cells {
        out.push_str(&format_row(row, &widths));
    }

    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            pad(&truncate(text, w), w)
        })
        .collect();
    let mut line = parts.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;

    #[test]
    fn table_columns_are_aligned() {
        let table = ResultTable {
            title: "Demo".to_string(),
            headers: vec!["name".to_string(), "σ".to_string()],
            rows: vec![
                vec![Cell::text("a"), Cell::Fixed(0.5, 3)],
                vec![Cell::text("longer"), Cell::Fixed(12.3, 1)],
            ],
        };

        let expected = concat!(
            "Demo:\n",
            "name    σ\n",
            "------  -----\n",
            "a       0.500\n",
            "longer  12.3\n",
        );
        assert_eq!(format_table(&table), expected);
    }

    #[test]
    fn report_lists_skipped_rows() {
        let errors = vec![RowError {
            line: 4,
            message: "Invalid reading 'x'.".to_string(),
        }];
        let txt = format_report(ExperimentKind::Emf, None, &errors, &[]);
        assert!(txt.starts_with("=== labfit - Electrode potentials"));
        assert!(txt.contains("Skipped rows: 1\n  line 4: Invalid reading 'x'."));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
