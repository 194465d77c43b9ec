use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::session::TIME_COLUMN;

/// One CSV record as written by the session store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn read_csv(path: &Path) -> Result<Table> {
    let contents = fs::read_to_string(path)?;
    parse_csv(path, &contents)
}

/// Parses a record. Rows that do not match the header (a tracer killed
/// mid-append leaves one behind) are skipped with a warning; only a missing
/// `time` column makes the whole record unreadable.
pub fn parse_csv(path: &Path, contents: &str) -> Result<Table> {
    let mut lines = contents.lines();
    let Some(header) = lines.next() else {
        return Ok(Table::default());
    };
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
    if !columns.iter().any(|c| c == TIME_COLUMN) {
        return Err(Error::MalformedRecord {
            path: path.to_path_buf(),
            reason: format!("missing `{TIME_COLUMN}` column"),
        });
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line, columns.len()) {
            Some(row) => rows.push(row),
            None => {
                tracing::warn!(
                    path = %path.display(),
                    line = i + 2,
                    "skipping row that does not match the header"
                );
            }
        }
    }

    Ok(Table { columns, rows })
}

fn parse_row(line: &str, width: usize) -> Option<Vec<f64>> {
    let row: Vec<f64> = line
        .split(',')
        .map(|cell| cell.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    (row.len() == width).then_some(row)
}

/// Several records joined on `time`: one row per distinct timestamp across
/// all inputs, ascending, with missing cells filled with zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedTable {
    pub time: Vec<f64>,
    /// Value columns in join order, excluding `time`.
    pub columns: Vec<(String, Vec<f64>)>,
}

fn time_key(t: f64) -> u64 {
    // 0.0 and -0.0 must collide.
    if t == 0.0 { 0 } else { t.to_bits() }
}

pub fn outer_join(tables: &[Table]) -> MergedTable {
    let mut time: Vec<f64> = tables
        .iter()
        .filter_map(|t| t.column_index(TIME_COLUMN).map(|i| (t, i)))
        .flat_map(|(t, i)| t.rows.iter().map(move |row| row[i]))
        .filter(|v| !v.is_nan())
        .collect();
    time.sort_by(|a, b| a.total_cmp(b));
    time.dedup_by(|a, b| time_key(*a) == time_key(*b));

    let mut columns = Vec::new();
    for table in tables {
        let Some(time_idx) = table.column_index(TIME_COLUMN) else {
            continue;
        };
        let by_time: HashMap<u64, &Vec<f64>> = table
            .rows
            .iter()
            .map(|row| (time_key(row[time_idx]), row))
            .collect();

        for (col_idx, name) in table.columns.iter().enumerate() {
            if col_idx == time_idx {
                continue;
            }
            let values = time
                .iter()
                .map(|t| {
                    by_time
                        .get(&time_key(*t))
                        .map(|row| row[col_idx])
                        .filter(|v| !v.is_nan())
                        .unwrap_or(0.0)
                })
                .collect();
            columns.push((name.clone(), values));
        }
    }

    MergedTable { time, columns }
}

impl MergedTable {
    pub fn row_count(&self) -> usize {
        self.time.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.push((name.into(), values));
    }
}
