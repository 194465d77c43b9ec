//! Reads a finished session back and reshapes it for charting.
//!
//! This module is pure data: it never touches the terminal.

pub mod series;
pub mod table;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::{COMMAND_FILE, EntityRole, SYSTEM_FILE};
use series::PlotModel;
use table::{MergedTable, Table, outer_join, read_csv};

pub const ROOT_MEM_COLUMN: &str = "pid.mem";
pub const TOTAL_MEM_COLUMN: &str = "pid.mem_total";

/// Raw contents of a session directory.
#[derive(Clone, Debug)]
pub struct SessionData {
    pub dir: PathBuf,
    pub command: Option<String>,
    pub system: Table,
    /// Root first, then children by ascending pid, then unrecognised records
    /// by file name.
    pub records: Vec<(String, Table)>,
}

pub fn load_session(dir: &Path) -> Result<SessionData> {
    let system_path = dir.join(SYSTEM_FILE);
    if !system_path.is_file() {
        return Err(Error::MissingSystemRecord {
            dir: dir.to_path_buf(),
        });
    }
    let system = read_csv(&system_path)?;

    let command = fs::read_to_string(dir.join(COMMAND_FILE))
        .ok()
        .map(|c| c.trim().to_string());

    let mut names: Vec<String> = fs::read_dir(dir)?
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".csv") && name != SYSTEM_FILE)
        .collect();
    names.sort_by_key(|name| record_order(name));

    let mut records = Vec::with_capacity(names.len());
    for name in names {
        let table = read_csv(&dir.join(&name))?;
        if table.is_empty() {
            tracing::warn!(record = %name, "skipping empty record");
            continue;
        }
        records.push((name, table));
    }

    Ok(SessionData {
        dir: dir.to_path_buf(),
        command,
        system,
        records,
    })
}

fn record_order(name: &str) -> (u8, u32, String) {
    match EntityRole::parse_file_name(name) {
        Some((EntityRole::Root, pid)) => (0, pid, String::new()),
        Some((EntityRole::Child, pid)) => (1, pid, String::new()),
        None => (2, 0, name.to_string()),
    }
}

impl SessionData {
    pub fn title(&self) -> String {
        match &self.command {
            Some(command) if !command.is_empty() => format!("Memory usage '{command}'"),
            _ => "Memory usage".to_string(),
        }
    }

    /// Outer join of every record on `time`, plus the derived total memory of
    /// the root and all of its children.
    pub fn merge(&self) -> MergedTable {
        let mut tables = Vec::with_capacity(self.records.len() + 1);
        tables.push(self.system.clone());
        tables.extend(self.records.iter().map(|(_, t)| t.clone()));

        let mut merged = outer_join(&tables);
        let total = total_memory(&merged);
        merged.push_column(TOTAL_MEM_COLUMN, total);
        merged
    }

    pub fn plot_model(&self) -> PlotModel {
        PlotModel::from_merged(self.title(), &self.merge())
    }
}

pub fn is_child_mem_column(name: &str) -> bool {
    name.strip_prefix("child.")
        .and_then(|rest| rest.strip_suffix(".mem"))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Root memory plus every child's memory, row by row, from zero-filled values.
pub fn total_memory(merged: &MergedTable) -> Vec<f64> {
    let mut total = merged
        .column(ROOT_MEM_COLUMN)
        .map(<[f64]>::to_vec)
        .unwrap_or_else(|| vec![0.0; merged.row_count()]);
    for (_, values) in merged
        .columns
        .iter()
        .filter(|(name, _)| is_child_mem_column(name))
    {
        for (acc, v) in total.iter_mut().zip(values) {
            *acc += v;
        }
    }
    total
}

pub fn build_plot(dir: &Path) -> Result<PlotModel> {
    Ok(load_session(dir)?.plot_model())
}
