//! Fixed-rate sampling of a root process and every descendant it spawns.

pub mod governor;
pub mod launch;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::session::{EntityRole, EntitySample, SessionStore, SystemSample};
use crate::system::probe::ProcessProbe;
use crate::system::snapshot::{EntitySnapshot, ProcessHandle};
use governor::RateGovernor;
use launch::{LaunchedCommand, Liveness};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
    Draining,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    /// The root vanished between the liveness check and its stat query.
    RootGone,
}

/// A traced process. Entities are never removed once tracked; a dead one is
/// simply no longer sampled.
#[derive(Clone, Debug)]
pub struct Entity {
    pub pid: u32,
    pub role: EntityRole,
    pub handle: ProcessHandle,
    pub rows: u64,
    pub missed: u64,
}

impl Entity {
    fn new(role: EntityRole, handle: ProcessHandle) -> Self {
        Entity {
            pid: handle.pid(),
            role,
            handle,
            rows: 0,
            missed: 0,
        }
    }

    /// No row has been committed for this entity yet. The store decides
    /// headers from the record itself; this only reflects engine state.
    pub fn first_seen(&self) -> bool {
        self.rows == 0
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub command: String,
    pub root_pid: Option<u32>,
    pub cycles: u64,
    pub system_rows: u64,
    pub root_rows: u64,
    pub child_rows: u64,
    pub tracked_children: usize,
    pub missed_child_samples: u64,
    pub elapsed_secs: f64,
    pub target_period_secs: f64,
}

impl SessionSummary {
    /// Achieved mean time between cycles, if any cycle ran.
    pub fn mean_period_secs(&self) -> Option<f64> {
        (self.cycles > 0).then(|| self.elapsed_secs / self.cycles as f64)
    }
}

pub struct Sampler<P: ProcessProbe> {
    probe: P,
    store: SessionStore,
    governor: RateGovernor,
    state: EngineState,
    root: Option<Entity>,
    tracked: BTreeMap<u32, Entity>,
    cycles: u64,
    system_rows: u64,
}

impl<P: ProcessProbe> Sampler<P> {
    pub fn new(probe: P, store: SessionStore, governor: RateGovernor) -> Self {
        Sampler {
            probe,
            store,
            governor,
            state: EngineState::Idle,
            root: None,
            tracked: BTreeMap::new(),
            cycles: 0,
            system_rows: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn root(&self) -> Option<&Entity> {
        self.root.as_ref()
    }

    /// Children seen so far, keyed by pid.
    pub fn tracked(&self) -> &BTreeMap<u32, Entity> {
        &self.tracked
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    /// Resolves the root and enters `Running`.
    pub fn attach_root(&mut self, pid: u32) -> Result<()> {
        let handle = self.probe.attach(pid)?;
        self.root = Some(Entity::new(EntityRole::Root, handle));
        self.state = EngineState::Running;
        Ok(())
    }

    /// Samples until `root` stops running or vanishes mid-cycle, then writes
    /// the session summary.
    pub fn run(&mut self, root: &mut impl Liveness) -> Result<SessionSummary> {
        let started = Instant::now();

        match self.attach_root(root.pid()) {
            Ok(()) => {}
            Err(Error::NoSuchProcess { pid }) => {
                tracing::warn!(pid, "root process exited before sampling started");
                self.state = EngineState::Draining;
            }
            Err(e) => return Err(e),
        }

        while self.state == EngineState::Running {
            if !root.is_running() {
                self.state = EngineState::Draining;
                break;
            }
            let cycle_start = Instant::now();
            if self.sample_cycle()? == CycleOutcome::RootGone {
                self.state = EngineState::Draining;
                break;
            }
            self.governor.pace(cycle_start);
        }

        self.state = EngineState::Stopped;
        let summary = self.summary(started.elapsed());
        self.store.write_summary(&summary)?;
        tracing::info!(
            cycles = summary.cycles,
            children = summary.tracked_children,
            mean_period_secs = summary.mean_period_secs().unwrap_or(0.0),
            target_period_secs = summary.target_period_secs,
            "sampling finished"
        );
        Ok(summary)
    }

    /// One pass over system, root and every live descendant.
    pub fn sample_cycle(&mut self) -> Result<CycleOutcome> {
        let root_handle = self
            .root
            .as_ref()
            .map(|e| e.handle)
            .ok_or(Error::RootNotAttached)?;

        let _span = tracing::debug_span!("sampler.cycle", cycle = self.cycles).entered();
        self.cycles += 1;

        let time = self.store.elapsed();
        let system = self.probe.system_snapshot();
        self.store.append_system(&SystemSample {
            time,
            snapshot: system,
        })?;
        self.system_rows += 1;

        let root_snapshot = match self.probe.entity_snapshot(&root_handle) {
            Ok(snapshot) => snapshot,
            Err(Error::NoSuchProcess { pid }) => {
                tracing::warn!(pid, "root process does not exist anymore");
                return Ok(CycleOutcome::RootGone);
            }
            Err(e) => return Err(e),
        };
        if let Some(root) = self.root.as_mut() {
            commit(&self.store, root, time, root_snapshot)?;
        }

        for handle in self.probe.list_children(&root_handle) {
            let entity = self.tracked.entry(handle.pid()).or_insert_with(|| {
                tracing::debug!(pid = handle.pid(), "tracking new child process");
                Entity::new(EntityRole::Child, handle)
            });

            // Known ids keep their original handle.
            match self.probe.entity_snapshot(&entity.handle) {
                Ok(snapshot) => commit(&self.store, entity, time, snapshot)?,
                Err(Error::NoSuchProcess { pid }) => {
                    entity.missed += 1;
                    tracing::warn!(pid, "child process does not exist anymore");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(CycleOutcome::Continue)
    }

    fn summary(&self, elapsed: Duration) -> SessionSummary {
        SessionSummary {
            command: self.store.command().join(" "),
            root_pid: self.root.as_ref().map(|e| e.pid),
            cycles: self.cycles,
            system_rows: self.system_rows,
            root_rows: self.root.as_ref().map_or(0, |e| e.rows),
            child_rows: self.tracked.values().map(|e| e.rows).sum(),
            tracked_children: self.tracked.len(),
            missed_child_samples: self.tracked.values().map(|e| e.missed).sum(),
            elapsed_secs: elapsed.as_secs_f64(),
            target_period_secs: self.governor.period().as_secs_f64(),
        }
    }
}

/// Creates a session under `output_root` and launches `command` into it. A
/// command that cannot be started leaves no session directory behind.
pub fn start_session(
    output_root: &Path,
    command: &[String],
) -> Result<(SessionStore, LaunchedCommand)> {
    let store = SessionStore::create(output_root, command)?;
    match LaunchedCommand::spawn(command) {
        Ok(launched) => Ok((store, launched)),
        Err(e) => {
            store.discard()?;
            Err(e)
        }
    }
}

fn commit(
    store: &SessionStore,
    entity: &mut Entity,
    time: f64,
    snapshot: EntitySnapshot,
) -> Result<()> {
    store.append_entity(&EntitySample {
        pid: entity.pid,
        role: entity.role,
        time,
        snapshot,
    })?;
    entity.rows += 1;
    Ok(())
}

#[cfg(test)]
mod tests;
