//! On-disk layout of one traced run.
//!
//! A session directory holds `command.txt`, `system.csv`, one `pid_<id>.csv`
//! for the root process and one `child_<id>.csv` per descendant. Every append
//! opens, writes one full line and closes the file again, so a killed tracer
//! never leaves earlier rows half-flushed.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::system::snapshot::{EntitySnapshot, SystemSnapshot};

pub const COMMAND_FILE: &str = "command.txt";
pub const SYSTEM_FILE: &str = "system.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const TIME_COLUMN: &str = "time";

const DIR_PREFIX: &str = "memtrail_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityRole {
    Root,
    Child,
}

impl EntityRole {
    pub fn file_name(self, pid: u32) -> String {
        match self {
            EntityRole::Root => format!("pid_{pid}.csv"),
            EntityRole::Child => format!("child_{pid}.csv"),
        }
    }

    /// Inverse of [`EntityRole::file_name`].
    pub fn parse_file_name(name: &str) -> Option<(EntityRole, u32)> {
        let stem = name.strip_suffix(".csv")?;
        if let Some(id) = stem.strip_prefix("pid_") {
            return id.parse().ok().map(|pid| (EntityRole::Root, pid));
        }
        if let Some(id) = stem.strip_prefix("child_") {
            return id.parse().ok().map(|pid| (EntityRole::Child, pid));
        }
        None
    }
}

/// One row destined for a session record.
pub trait Record {
    fn file_name(&self) -> String;
    fn header(&self) -> Vec<String>;
    fn values(&self) -> Vec<f64>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemSample {
    pub time: f64,
    pub snapshot: SystemSnapshot,
}

impl Record for SystemSample {
    fn file_name(&self) -> String {
        SYSTEM_FILE.to_string()
    }

    fn header(&self) -> Vec<String> {
        [
            TIME_COLUMN,
            "sys.mem.total",
            "sys.mem.available",
            "sys.mem.percent",
            "sys.mem.used",
            "sys.mem.free",
            "sys.cpu",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn values(&self) -> Vec<f64> {
        let s = &self.snapshot;
        vec![
            self.time,
            s.mem_total_mb,
            s.mem_available_mb,
            s.mem_percent,
            s.mem_used_mb,
            s.mem_free_mb,
            s.cpu_percent,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySample {
    pub pid: u32,
    pub role: EntityRole,
    pub time: f64,
    pub snapshot: EntitySnapshot,
}

impl Record for EntitySample {
    fn file_name(&self) -> String {
        self.role.file_name(self.pid)
    }

    fn header(&self) -> Vec<String> {
        let prefix = match self.role {
            EntityRole::Root => "pid".to_string(),
            EntityRole::Child => format!("child.{}", self.pid),
        };
        vec![
            TIME_COLUMN.to_string(),
            format!("{prefix}.mem"),
            format!("{prefix}.cpu"),
        ]
    }

    fn values(&self) -> Vec<f64> {
        vec![self.time, self.snapshot.rss_mb, self.snapshot.cpu_percent]
    }
}

pub struct SessionStore {
    dir: PathBuf,
    command: Vec<String>,
    started: Instant,
}

impl SessionStore {
    /// Opens (or creates) `dir` and records `command` in it. Reopening an
    /// existing session keeps its command artifact and records intact.
    pub fn open(dir: impl Into<PathBuf>, command: &[String]) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::storage(&dir, e))?;

        let command_path = dir.join(COMMAND_FILE);
        if !command_path.exists() {
            fs::write(&command_path, command.join(" "))
                .map_err(|e| Error::storage(&command_path, e))?;
        }

        tracing::debug!(dir = %dir.display(), "session opened");
        Ok(SessionStore {
            dir,
            command: command.to_vec(),
            started: Instant::now(),
        })
    }

    /// Creates a fresh timestamped session directory under `root`.
    pub fn create(root: &Path, command: &[String]) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S").to_string();
        let mut dir = root.join(format!("{DIR_PREFIX}{stamp}.log"));
        let mut attempt = 1;
        while is_non_empty_dir(&dir) {
            attempt += 1;
            dir = root.join(format!("{DIR_PREFIX}{stamp}-{attempt}.log"));
        }
        Self::open(dir, command)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Seconds since the session was opened; the `time` column of every row.
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn append_system(&self, sample: &SystemSample) -> Result<()> {
        self.append(sample)
    }

    pub fn append_entity(&self, sample: &EntitySample) -> Result<()> {
        self.append(sample)
    }

    /// Appends one row, writing the header first if the record is empty. A
    /// record whose last line was cut short gets a line break first, so the
    /// fragment stays on a line of its own.
    pub fn append(&self, record: &impl Record) -> Result<()> {
        let path = self.dir.join(record.file_name());
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::storage(&path, e))?;
        let len = file.metadata().map_err(|e| Error::storage(&path, e))?.len();

        let mut line = String::new();
        if len == 0 {
            line.push_str(&record.header().join(","));
            line.push('\n');
        } else if !ends_with_newline(&mut file).map_err(|e| Error::storage(&path, e))? {
            tracing::warn!(path = %path.display(), "record ends in a partial row");
            line.push('\n');
        }
        let values: Vec<String> = record.values().iter().map(f64::to_string).collect();
        line.push_str(&values.join(","));
        line.push('\n');

        file.write_all(line.as_bytes())
            .map_err(|e| Error::storage(&path, e))
    }

    /// Removes the session directory and everything in it.
    pub fn discard(self) -> Result<()> {
        tracing::debug!(dir = %self.dir.display(), "discarding session");
        fs::remove_dir_all(&self.dir).map_err(|e| Error::storage(&self.dir, e))
    }

    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<()> {
        let path = self.dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary).map_err(|e| {
            Error::storage(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        fs::write(&path, json).map_err(|e| Error::storage(&path, e))
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn is_non_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
