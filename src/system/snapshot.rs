pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Host-wide memory and CPU reading. Memory values are in megabytes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SystemSnapshot {
    pub mem_total_mb: f64,
    pub mem_available_mb: f64,
    pub mem_used_mb: f64,
    pub mem_free_mb: f64,
    pub mem_percent: f64,
    pub cpu_percent: f64,
}

impl SystemSnapshot {
    pub fn from_bytes(total: u64, available: u64, used: u64, free: u64, cpu_percent: f32) -> Self {
        let mem_percent = if total > 0 {
            total.saturating_sub(available) as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        SystemSnapshot {
            mem_total_mb: bytes_to_mb(total),
            mem_available_mb: bytes_to_mb(available),
            mem_used_mb: bytes_to_mb(used),
            mem_free_mb: bytes_to_mb(free),
            mem_percent,
            cpu_percent: f64::from(cpu_percent),
        }
    }
}

/// Per-process reading: resident set size in megabytes and CPU percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EntitySnapshot {
    pub rss_mb: f64,
    pub cpu_percent: f64,
}

/// Opaque reference to a process the probe can query repeatedly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessHandle {
    pid: u32,
}

impl ProcessHandle {
    pub fn new(pid: u32) -> Self {
        ProcessHandle { pid }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}
