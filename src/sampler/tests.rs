use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::governor::RateGovernor;
use super::launch::Liveness;
use super::{CycleOutcome, EngineState, Sampler, start_session};
use crate::error::{Error, Result};
use crate::session::{COMMAND_FILE, SYSTEM_FILE, SessionStore};
use crate::system::probe::ProcessProbe;
use crate::system::snapshot::{EntitySnapshot, ProcessHandle, SystemSnapshot};

const ROOT: u32 = 100;

/// Scripted process table. `cycle` advances on every system snapshot, which
/// is the first probe call of each sampling cycle.
#[derive(Default)]
struct FakeProbe {
    cycle: usize,
    root_missing: bool,
    root_dies_at: Option<usize>,
    /// Children listed per cycle (1-based); cycles past the end list none.
    children: Vec<Vec<u32>>,
    /// Child pid -> cycles in which its stat query fails.
    failures: HashMap<u32, HashSet<usize>>,
}

impl FakeProbe {
    fn with_children(children: Vec<Vec<u32>>) -> Self {
        FakeProbe {
            children,
            ..Default::default()
        }
    }

    fn fail(mut self, pid: u32, cycles: &[usize]) -> Self {
        self.failures
            .entry(pid)
            .or_default()
            .extend(cycles.iter().copied());
        self
    }
}

impl ProcessProbe for FakeProbe {
    fn system_snapshot(&mut self) -> SystemSnapshot {
        self.cycle += 1;
        SystemSnapshot {
            mem_total_mb: 1024.0,
            mem_available_mb: 512.0,
            mem_used_mb: 512.0,
            mem_free_mb: 256.0,
            mem_percent: 50.0,
            cpu_percent: 10.0,
        }
    }

    fn attach(&mut self, pid: u32) -> Result<ProcessHandle> {
        if self.root_missing {
            return Err(Error::NoSuchProcess { pid });
        }
        Ok(ProcessHandle::new(pid))
    }

    fn entity_snapshot(&mut self, handle: &ProcessHandle) -> Result<EntitySnapshot> {
        let pid = handle.pid();
        let dead_root = pid == ROOT && self.root_dies_at.is_some_and(|c| self.cycle >= c);
        let dead_child = self
            .failures
            .get(&pid)
            .is_some_and(|cycles| cycles.contains(&self.cycle));
        if dead_root || dead_child {
            return Err(Error::NoSuchProcess { pid });
        }
        Ok(EntitySnapshot {
            rss_mb: f64::from(pid),
            cpu_percent: 1.0,
        })
    }

    fn list_children(&mut self, _handle: &ProcessHandle) -> Vec<ProcessHandle> {
        self.children
            .get(self.cycle.saturating_sub(1))
            .map(|pids| pids.iter().copied().map(ProcessHandle::new).collect())
            .unwrap_or_default()
    }
}

/// Root that reports itself alive for a fixed number of checks.
struct ScriptedRoot {
    alive_checks: usize,
}

impl Liveness for ScriptedRoot {
    fn pid(&self) -> u32 {
        ROOT
    }

    fn is_running(&mut self) -> bool {
        if self.alive_checks == 0 {
            return false;
        }
        self.alive_checks -= 1;
        true
    }
}

fn sampler(dir: &Path, probe: FakeProbe) -> Sampler<FakeProbe> {
    let store = SessionStore::open(dir, &["sleep".to_string(), "1".to_string()]).unwrap();
    Sampler::new(probe, store, RateGovernor::new(Duration::ZERO))
}

fn data_rows(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|c| c.lines().count().saturating_sub(1))
        .unwrap_or(0)
}

fn times(path: &Path) -> Vec<f64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect()
}

#[test]
fn samples_system_root_and_children_each_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe::with_children(vec![vec![101], vec![101, 102], vec![101, 102]]);
    let mut sampler = sampler(tmp.path(), probe);

    let summary = sampler.run(&mut ScriptedRoot { alive_checks: 3 }).unwrap();

    assert_eq!(sampler.state(), EngineState::Stopped);
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.system_rows, 3);
    assert_eq!(summary.root_rows, 3);
    assert_eq!(summary.child_rows, 5);
    assert_eq!(summary.tracked_children, 2);

    assert_eq!(data_rows(&tmp.path().join(SYSTEM_FILE)), 3);
    assert_eq!(data_rows(&tmp.path().join("pid_100.csv")), 3);
    assert_eq!(data_rows(&tmp.path().join("child_101.csv")), 3);
    assert_eq!(data_rows(&tmp.path().join("child_102.csv")), 2);
    assert!(tmp.path().join("summary.json").exists());
}

#[test]
fn failing_child_does_not_stop_siblings_or_root() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe::with_children(vec![vec![11, 12]; 4]).fail(11, &[2, 3]);
    let mut sampler = sampler(tmp.path(), probe);

    let summary = sampler.run(&mut ScriptedRoot { alive_checks: 4 }).unwrap();

    assert_eq!(summary.cycles, 4);
    assert_eq!(data_rows(&tmp.path().join("pid_100.csv")), 4);
    assert_eq!(data_rows(&tmp.path().join("child_12.csv")), 4);
    // Resumed after the failures, without gap markers.
    assert_eq!(data_rows(&tmp.path().join("child_11.csv")), 2);
    assert_eq!(sampler.tracked()[&11].missed, 2);
    assert_eq!(summary.missed_child_samples, 2);
}

#[test]
fn root_dead_before_first_check_writes_no_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("session");
    let probe = FakeProbe {
        root_missing: true,
        ..Default::default()
    };
    let mut sampler = sampler(&dir, probe);

    let summary = sampler.run(&mut ScriptedRoot { alive_checks: 5 }).unwrap();

    assert_eq!(sampler.state(), EngineState::Stopped);
    assert_eq!(summary.cycles, 0);
    assert!(sampler.root().is_none());
    assert!(dir.join(COMMAND_FILE).exists());
    assert!(!dir.join(SYSTEM_FILE).exists());
    assert!(!dir.join("pid_100.csv").exists());
}

#[test]
fn liveness_false_at_first_check_writes_no_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sampler = sampler(tmp.path(), FakeProbe::default());

    let summary = sampler.run(&mut ScriptedRoot { alive_checks: 0 }).unwrap();

    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.root_pid, Some(ROOT));
    assert!(!tmp.path().join(SYSTEM_FILE).exists());
    assert!(!tmp.path().join("pid_100.csv").exists());
}

#[test]
fn root_vanishing_mid_cycle_drains_without_error() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe {
        root_dies_at: Some(3),
        children: vec![vec![7]; 10],
        ..Default::default()
    };
    let mut sampler = sampler(tmp.path(), probe);

    let summary = sampler.run(&mut ScriptedRoot { alive_checks: 10 }).unwrap();

    assert_eq!(sampler.state(), EngineState::Stopped);
    assert_eq!(summary.cycles, 3);
    // System row for the failing cycle is already committed.
    assert_eq!(data_rows(&tmp.path().join(SYSTEM_FILE)), 3);
    assert_eq!(data_rows(&tmp.path().join("pid_100.csv")), 2);
    assert_eq!(data_rows(&tmp.path().join("child_7.csv")), 2);
}

#[test]
fn tracked_set_only_grows_and_dead_children_stop_appending() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe::with_children(vec![vec![], vec![55], vec![55], vec![], vec![]]);
    let mut sampler = sampler(tmp.path(), probe);

    sampler.run(&mut ScriptedRoot { alive_checks: 5 }).unwrap();

    assert_eq!(sampler.tracked().len(), 1);
    let child = &sampler.tracked()[&55];
    assert_eq!(child.rows, 2);
    assert!(!child.first_seen());
    assert_eq!(data_rows(&tmp.path().join("child_55.csv")), 2);
    assert_eq!(data_rows(&tmp.path().join("pid_100.csv")), 5);
    assert_eq!(data_rows(&tmp.path().join(SYSTEM_FILE)), 5);
}

#[test]
fn time_column_is_monotonic_per_file() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe::with_children(vec![vec![3, 4]; 6]).fail(4, &[2]);
    let mut sampler = sampler(tmp.path(), probe);

    sampler.run(&mut ScriptedRoot { alive_checks: 6 }).unwrap();

    for name in [SYSTEM_FILE, "pid_100.csv", "child_3.csv", "child_4.csv"] {
        let values = times(&tmp.path().join(name));
        assert!(!values.is_empty(), "{name} has no rows");
        assert!(
            values.windows(2).all(|w| w[0] <= w[1]),
            "{name} not monotonic: {values:?}"
        );
    }
}

#[test]
fn cycle_without_root_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sampler = sampler(tmp.path(), FakeProbe::default());

    assert_eq!(sampler.state(), EngineState::Idle);
    let err = sampler.sample_cycle().unwrap_err();
    assert!(matches!(err, Error::RootNotAttached));
    assert!(!tmp.path().join(SYSTEM_FILE).exists());
}

#[test]
fn manual_cycles_after_attach() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sampler = sampler(tmp.path(), FakeProbe::with_children(vec![vec![9]]));

    sampler.attach_root(ROOT).unwrap();
    assert_eq!(sampler.state(), EngineState::Running);
    assert_eq!(sampler.sample_cycle().unwrap(), CycleOutcome::Continue);
    assert_eq!(sampler.root().map(|r| r.rows), Some(1));
    assert_eq!(sampler.tracked()[&9].rows, 1);
}

#[test]
fn child_that_never_answers_stays_first_seen() {
    let tmp = tempfile::tempdir().unwrap();
    let probe = FakeProbe::with_children(vec![vec![7, 8], vec![7, 8]]).fail(8, &[1, 2]);
    let mut sampler = sampler(tmp.path(), probe);

    sampler.attach_root(ROOT).unwrap();
    assert!(sampler.root().is_some_and(|r| r.first_seen()));
    sampler.sample_cycle().unwrap();
    sampler.sample_cycle().unwrap();

    assert!(sampler.root().is_some_and(|r| !r.first_seen()));
    assert!(!sampler.tracked()[&7].first_seen());
    let silent = &sampler.tracked()[&8];
    assert!(silent.first_seen());
    assert_eq!(silent.missed, 2);
    assert!(!tmp.path().join("child_8.csv").exists());
}

#[test]
fn unlaunchable_command_leaves_no_session_behind() {
    let tmp = tempfile::tempdir().unwrap();
    let command = vec!["memtrail-no-such-binary-xyz".to_string()];

    let err = start_session(tmp.path(), &command).err().unwrap();
    assert!(matches!(err, Error::Launch { .. }));
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn launched_command_runs_inside_a_fresh_session() {
    let tmp = tempfile::tempdir().unwrap();
    let (store, mut launched) = start_session(tmp.path(), &["true".to_string()]).unwrap();

    assert!(store.dir().starts_with(tmp.path()));
    assert!(store.dir().join(COMMAND_FILE).is_file());
    assert!(launched.wait().unwrap().success());
}
