use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use super::process::{ProcessInfo, build_process_tree_from_flat};
use super::snapshot::{EntitySnapshot, ProcessHandle, SystemSnapshot, bytes_to_mb};
use crate::error::{Error, Result};

/// Read-only view of the OS process table used by the sampler.
///
/// Implementations report a vanished process as [`Error::NoSuchProcess`];
/// callers decide whether that ends the session (root) or just skips one
/// sample (child).
pub trait ProcessProbe {
    /// Host-wide memory and CPU. Never fails; falls back to the last reading.
    fn system_snapshot(&mut self) -> SystemSnapshot;

    /// Resolves `pid` to a handle, failing if it is not a live process.
    fn attach(&mut self, pid: u32) -> Result<ProcessHandle>;

    fn entity_snapshot(&mut self, handle: &ProcessHandle) -> Result<EntitySnapshot>;

    /// Live descendants of `handle`, recursively, sorted by pid. Empty when the
    /// process has none or no longer exists.
    fn list_children(&mut self, handle: &ProcessHandle) -> Vec<ProcessHandle>;
}

pub struct SysinfoProbe {
    sys: System,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        SysinfoProbe { sys }
    }

    fn refresh_one(&mut self, pid: u32) -> Option<&Process> {
        let pid = Pid::from_u32(pid);
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        self.sys.process(pid).filter(|p| is_live(p))
    }
}

fn is_live(process: &Process) -> bool {
    !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

impl ProcessProbe for SysinfoProbe {
    fn system_snapshot(&mut self) -> SystemSnapshot {
        self.sys.refresh_memory();
        self.sys.refresh_cpu_usage();
        SystemSnapshot::from_bytes(
            self.sys.total_memory(),
            self.sys.available_memory(),
            self.sys.used_memory(),
            self.sys.free_memory(),
            self.sys.global_cpu_usage(),
        )
    }

    fn attach(&mut self, pid: u32) -> Result<ProcessHandle> {
        match self.refresh_one(pid) {
            Some(_) => Ok(ProcessHandle::new(pid)),
            None => Err(Error::NoSuchProcess { pid }),
        }
    }

    fn entity_snapshot(&mut self, handle: &ProcessHandle) -> Result<EntitySnapshot> {
        let pid = handle.pid();
        let process = self
            .refresh_one(pid)
            .ok_or(Error::NoSuchProcess { pid })?;
        Ok(EntitySnapshot {
            rss_mb: bytes_to_mb(process.memory()),
            cpu_percent: f64::from(process.cpu_usage()),
        })
    }

    fn list_children(&mut self, handle: &ProcessHandle) -> Vec<ProcessHandle> {
        let _span = tracing::trace_span!("probe.list_children", pid = handle.pid()).entered();

        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let flat: Vec<ProcessInfo> = self
            .sys
            .processes()
            .iter()
            // Linux lists threads as tasks; only real processes are tracked.
            .filter(|(_, p)| p.thread_kind().is_none() && is_live(p))
            .map(|(pid, p)| {
                ProcessInfo::new(
                    pid.as_u32(),
                    p.parent().map(|pp| pp.as_u32()).unwrap_or(0),
                    p.name().to_string_lossy(),
                )
            })
            .collect();

        build_process_tree_from_flat(flat)
            .descendants(handle.pid())
            .into_iter()
            .map(ProcessHandle::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_sample_current_process() {
        let mut probe = SysinfoProbe::new();
        let handle = probe.attach(std::process::id()).unwrap();
        let snap = probe.entity_snapshot(&handle).unwrap();
        assert!(snap.rss_mb > 0.0);
        assert!(snap.cpu_percent >= 0.0);
    }

    #[test]
    fn attach_unknown_pid_is_no_such_process() {
        let mut probe = SysinfoProbe::new();
        let err = probe.attach(u32::MAX - 1).unwrap_err();
        assert!(err.is_no_such_process());
    }

    #[test]
    fn system_snapshot_reports_memory() {
        let mut probe = SysinfoProbe::new();
        let snap = probe.system_snapshot();
        assert!(snap.mem_total_mb > 0.0);
        assert!(snap.mem_percent >= 0.0 && snap.mem_percent <= 100.0);
    }

    #[test]
    fn unknown_process_has_no_children() {
        let mut probe = SysinfoProbe::new();
        let children = probe.list_children(&ProcessHandle::new(u32::MAX - 1));
        assert!(children.is_empty());
    }
}
