use std::collections::{HashMap, VecDeque};

/// One row of the OS process table, reduced to what descendant discovery needs.
#[derive(Clone, Debug)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub children: Vec<u32>,
}

impl ProcessInfo {
    pub fn new(pid: u32, ppid: u32, name: impl Into<String>) -> Self {
        ProcessInfo {
            pid,
            ppid,
            name: name.into(),
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProcessTree {
    pub processes: HashMap<u32, ProcessInfo>,
}

pub fn build_process_tree_from_flat(processes: Vec<ProcessInfo>) -> ProcessTree {
    let mut by_pid = HashMap::with_capacity(processes.len());
    for mut process in processes {
        // Build parent-child links from pid/ppid only.
        process.children.clear();
        by_pid.insert(process.pid, process);
    }

    let pids: Vec<u32> = by_pid.keys().copied().collect();
    for pid in pids {
        let ppid = by_pid.get(&pid).map(|p| p.ppid).unwrap_or(0);
        if ppid == pid {
            continue;
        }
        if let Some(parent) = by_pid.get_mut(&ppid) {
            parent.children.push(pid);
        }
    }

    for process in by_pid.values_mut() {
        process.children.sort_unstable();
    }

    ProcessTree { processes: by_pid }
}

impl ProcessTree {
    /// All transitive descendants of `pid`, sorted ascending. Empty when `pid`
    /// is not in the table.
    pub fn descendants(&self, pid: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        if let Some(root) = self.processes.get(&pid) {
            queue.extend(root.children.iter().copied());
        }
        while let Some(next) = queue.pop_front() {
            // Guards against malformed tables with parent cycles.
            if next == pid || out.contains(&next) {
                continue;
            }
            out.push(next);
            if let Some(proc) = self.processes.get(&next) {
                queue.extend(proc.children.iter().copied());
            }
        }
        out.sort_unstable();
        out
    }
}
