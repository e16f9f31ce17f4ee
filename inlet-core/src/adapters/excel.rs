//! Excel statement parser
//!
//! Extracts the first sheet as a table and reuses the CSV header heuristics
//! on its header row, treating data rows as CSV records. Excel serial date
//! cells are converted before the shared date parsing runs.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use crate::domain::result::Result;
use crate::domain::{BankProfile, ParseResult, ParserConfig};
use crate::ports::StatementParser;

use super::csv::{convert_row, map_columns, ColumnMap};

pub struct ExcelParser {
    config: ParserConfig,
}

impl ExcelParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::new(
                "excel",
                &["xlsx", "xls"],
                &[
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    "application/vnd.ms-excel",
                ],
            ),
        }
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for ExcelParser {
    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse(&self, path: &Path, profile: Option<&BankProfile>) -> Result<ParseResult> {
        let mut workbook = match open_workbook_auto(path) {
            Ok(w) => w,
            Err(e) => return Ok(ParseResult::failed(format!("cannot open workbook: {e}"))),
        };

        let sheet_names = workbook.sheet_names().to_owned();
        let Some(sheet) = sheet_names.first().cloned() else {
            return Ok(ParseResult::failed("workbook has no sheets"));
        };
        let range = match workbook.worksheet_range(&sheet) {
            Ok(r) => r,
            Err(e) => {
                return Ok(ParseResult::failed(format!(
                    "cannot read sheet '{sheet}': {e}"
                )))
            }
        };

        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
        let mut result = parse_rows(&rows, profile);
        result.set_meta("sheet", sheet);
        Ok(result)
    }
}

fn parse_rows(rows: &[Vec<Data>], profile: Option<&BankProfile>) -> ParseResult {
    let csv_profile = profile.map(|p| &p.csv_config);
    let mut result = ParseResult::new();

    // Locate the header row the same way the CSV parser does
    let mut header: Option<(usize, Vec<String>, ColumnMap)> = None;
    for (idx, row) in rows.iter().take(10).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| cell_text(c, false)).collect();
        if let Some(map) = map_columns(&cells, csv_profile) {
            header = Some((idx, cells, map));
            break;
        }
    }
    let Some((header_idx, headers, columns)) = header else {
        return ParseResult::failed(
            "could not locate a header row mapping date, description and amount columns",
        );
    };
    debug!("excel header at row {header_idx}");

    let date_formats: Vec<String> = csv_profile
        .map(|p| p.date_formats.clone())
        .unwrap_or_default();

    for (row_number, row) in rows.iter().enumerate().skip(header_idx + 1) {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| cell_text(cell, idx == columns.date))
            .collect();
        match convert_row(&cells, &headers, &columns, &date_formats) {
            Ok(Some(tx)) => result.transactions.push(tx),
            Ok(None) => {}
            Err(problem) => result
                .warnings
                .push(format!("row {}: {problem}", row_number + 1)),
        }
    }

    result.set_meta("extraction_method", "excel");
    result.set_meta("header_row", header_idx);
    result.set_meta("row_count", result.transactions.len());
    result
}

/// Render one cell as text; numeric cells in the date column are treated
/// as Excel serial dates
fn cell_text(cell: &Data, date_column: bool) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if date_column {
                excel_serial_to_date(*f)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => {
            if date_column {
                excel_serial_to_date(*i as f64)
            } else {
                i.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

/// Excel epoch is 1899-12-30, accounting for the 1900 leap year bug
fn excel_serial_to_date(serial: f64) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn row(cells: &[Data]) -> Vec<Data> {
        cells.to_vec()
    }

    #[test]
    fn test_parse_rows_with_serial_dates() {
        let rows = vec![
            row(&[
                Data::String("Date".to_string()),
                Data::String("Description".to_string()),
                Data::String("Amount".to_string()),
            ]),
            row(&[
                Data::Float(45672.0), // 2025-01-15
                Data::String("Coffee Shop".to_string()),
                Data::Float(-4.5),
            ]),
            row(&[
                Data::Float(45673.0),
                Data::String("Salary".to_string()),
                Data::Float(2500.0),
            ]),
        ];
        let result = parse_rows(&rows, None);
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(
            result.transactions[0].date,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert_eq!(result.transactions[0].amount, Decimal::new(-450, 2));
        assert_eq!(result.transactions[1].amount, Decimal::new(250000, 2));
    }

    #[test]
    fn test_string_dates_also_accepted() {
        let rows = vec![
            row(&[
                Data::String("Date".to_string()),
                Data::String("Description".to_string()),
                Data::String("Amount".to_string()),
            ]),
            row(&[
                Data::String("2025-01-15".to_string()),
                Data::String("Coffee".to_string()),
                Data::String("-4.50".to_string()),
            ]),
        ];
        let result = parse_rows(&rows, None);
        assert_eq!(result.transactions.len(), 1);
    }

    #[test]
    fn test_unmappable_sheet_fails() {
        let rows = vec![row(&[
            Data::String("a".to_string()),
            Data::String("b".to_string()),
        ])];
        let result = parse_rows(&rows, None);
        assert!(!result.success);
    }

    #[test]
    fn test_bad_cells_degrade_to_warnings() {
        let rows = vec![
            row(&[
                Data::String("Date".to_string()),
                Data::String("Description".to_string()),
                Data::String("Amount".to_string()),
            ]),
            row(&[
                Data::String("2025-01-15".to_string()),
                Data::String("Broken".to_string()),
                Data::String("not-money".to_string()),
            ]),
            row(&[
                Data::String("2025-01-16".to_string()),
                Data::String("Fine".to_string()),
                Data::Float(-1.0),
            ]),
        ];
        let result = parse_rows(&rows, None);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), "2025-01-10");
        assert_eq!(excel_serial_to_date(45672.0), "2025-01-15");
    }
}
