use std::fmt::Write;

use crate::columns::COLUMN_SPECS;
use crate::models::{ComputeSummary, Table};

/// Renders a table as a left-aligned text grid. Only the first `limit`
/// rows are shown when a limit is given.
pub fn render_table(table: &Table, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(table.rows.len()).min(table.rows.len());
    let rows = &table.rows[..shown];

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    write_line(&mut output, &table.headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(&mut output, &rule, &widths);
    for row in rows {
        write_line(&mut output, row, &widths);
    }

    if shown < table.rows.len() {
        let _ = writeln!(output, "... {} more rows", table.rows.len() - shown);
    }

    output
}

fn write_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(output, "{}", line.join(" | ").trim_end());
}

pub fn render_summary(summary: &ComputeSummary) -> String {
    let mut output = String::new();
    let _ = write!(
        output,
        "Valued {} of {} rows",
        summary.rows_valued, summary.rows_read
    );
    if summary.rows_blank > 0 {
        let _ = write!(output, ", {} left blank (zero denominator)", summary.rows_blank);
    }
    if summary.rows_dropped > 0 {
        let _ = write!(output, ", {} dropped (zero denominator)", summary.rows_dropped);
    }
    output.push('.');
    output
}

pub fn render_expected_columns() -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Upload a CSV file with these columns:");
    let _ = writeln!(output);
    for spec in COLUMN_SPECS {
        let marker = if spec.required { "" } else { " (optional)" };
        let _ = writeln!(output, "- {}{}", spec.display, marker);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table {
            headers: vec!["sub_profile".to_string(), "value".to_string()],
            rows: vec![
                vec!["Outputs".to_string(), "11764.71".to_string()],
                vec!["Impact".to_string(), "".to_string()],
                vec!["Environment".to_string(), "9.5".to_string()],
            ],
        }
    }

    #[test]
    fn aligns_columns_to_widest_cell() {
        let rendered = render_table(&sample_table(), None);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "sub_profile | value");
        assert_eq!(lines[1], "----------- | --------");
        assert_eq!(lines[2], "Outputs     | 11764.71");
        assert_eq!(lines[3], "Impact      |");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn limit_truncates_and_notes_remaining_rows() {
        let rendered = render_table(&sample_table(), Some(1));
        assert_eq!(rendered.lines().count(), 4);
        assert!(rendered.ends_with("... 2 more rows\n"));
    }

    #[test]
    fn summary_mentions_blank_rows() {
        let summary = ComputeSummary {
            rows_read: 3,
            rows_valued: 2,
            rows_blank: 1,
            rows_dropped: 0,
        };
        assert_eq!(
            render_summary(&summary),
            "Valued 2 of 3 rows, 1 left blank (zero denominator)."
        );
    }

    #[test]
    fn lists_expected_upload_headers() {
        let rendered = render_expected_columns();
        assert!(rendered.contains("- Main panel (optional)\n"));
        assert!(rendered.contains("- Required number of items to be returned for sub-profile\n"));
    }
}
