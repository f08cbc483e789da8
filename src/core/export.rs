//! CSV export of the budget process list.
//!
//! Produces the spreadsheet-friendly view of [`ProcessRow`]s with a
//! configurable column set. Rows are CRLF-terminated as spreadsheet tools
//! expect.

use crate::core::process::ProcessRow;

/// Columns rendered when the caller does not pick any.
pub const DEFAULT_COLUMNS: &[&str] = &[
    "obr_name",
    "country_name",
    "rounds",
    "status",
    "updated_at",
];

/// Resolves a `fields=` selection to the known column keys, keeping the
/// caller's order. Unknown names are dropped; an empty result falls back to
/// the default set.
#[must_use]
pub fn resolve_columns(fields: Option<&str>) -> Vec<&'static str> {
    let known = |name: &str| -> Option<&'static str> {
        DEFAULT_COLUMNS
            .iter()
            .chain(["created_at"].iter())
            .find(|c| **c == name)
            .copied()
    };

    let picked: Vec<&'static str> = fields
        .unwrap_or("")
        .split(',')
        .filter_map(|f| known(f.trim()))
        .collect();

    if picked.is_empty() {
        DEFAULT_COLUMNS.to_vec()
    } else {
        picked
    }
}

fn header(column: &str) -> &'static str {
    match column {
        "obr_name" => "OBR name",
        "country_name" => "Country",
        "rounds" => "Rounds",
        "status" => "Status",
        "created_at" => "Creation date",
        "updated_at" => "Last update",
        _ => "",
    }
}

fn cell(row: &ProcessRow, column: &str) -> String {
    match column {
        "obr_name" => row.obr_name.clone(),
        "country_name" => row.country_name.clone(),
        "rounds" => row
            .round_numbers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        "status" => row.process.current_state_label.clone(),
        "created_at" => row.process.created_at.format("%Y-%m-%d").to_string(),
        "updated_at" => row.process.updated_at.format("%Y-%m-%d").to_string(),
        _ => String::new(),
    }
}

fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders the CSV document, header row included.
#[must_use]
pub fn export_csv(rows: &[ProcessRow], columns: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(
        &columns
            .iter()
            .map(|c| escape(header(c)))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push_str("\r\n");

    for row in rows {
        out.push_str(
            &columns
                .iter()
                .map(|c| escape(&cell(row, c)))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::budget_process;

    fn row(obr_name: &str, rounds: Vec<i32>) -> ProcessRow {
        ProcessRow {
            process: budget_process::Model {
                id: 1,
                current_state_key: "budget_submitted".to_string(),
                current_state_label: "Budget submitted".to_string(),
                created_by: 1,
                created_at: "2024-02-01T10:00:00Z".parse().unwrap(),
                updated_at: "2024-02-01T12:30:00Z".parse().unwrap(),
                is_deleted: false,
            },
            obr_name: obr_name.to_string(),
            country_name: "ANGOLA".to_string(),
            round_numbers: rounds,
        }
    }

    #[test]
    fn test_single_column_export() {
        let rows = vec![row("test campaign", vec![1]), row("test campaign", vec![2])];
        let csv = export_csv(&rows, &resolve_columns(Some("obr_name")));
        assert_eq!(csv, "OBR name\r\ntest campaign\r\ntest campaign\r\n");
    }

    #[test]
    fn test_date_column_renders_day_precision() {
        let rows = vec![row("c", vec![1])];
        let csv = export_csv(&rows, &resolve_columns(Some("updated_at")));
        assert_eq!(csv, "Last update\r\n2024-02-01\r\n");
    }

    #[test]
    fn test_default_columns_and_quoting() {
        let rows = vec![row("campaign, with comma", vec![1, 2])];
        let csv = export_csv(&rows, &resolve_columns(None));
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next().unwrap(),
            "OBR name,Country,Rounds,Status,Last update"
        );
        // Comma-bearing cells are quoted: the campaign name and round list.
        assert_eq!(
            lines.next().unwrap(),
            "\"campaign, with comma\",ANGOLA,\"1, 2\",Budget submitted,2024-02-01"
        );
    }

    #[test]
    fn test_unknown_fields_fall_back_to_defaults() {
        assert_eq!(resolve_columns(Some("nope,also_nope")), DEFAULT_COLUMNS);
        assert_eq!(
            resolve_columns(Some("updated_at,obr_name")),
            vec!["updated_at", "obr_name"]
        );
    }
}
