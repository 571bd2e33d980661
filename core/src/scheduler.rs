//! Scheduler loop: idle → running → idle, forever, on a fixed interval.
//!
//! A cycle never overlaps another. A failed cycle is logged and the loop
//! waits for the next interval; no failure ends the process.

use crate::{
    config::DetectorConfig,
    error::{DetectorError, DetectorResult, Stage},
    pipeline::{run_cycle, CycleReport},
    publisher::PublishOutcome,
    store::{CycleLogEntry, Store, StoreConnector},
    types::CycleId,
};
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed { stage: Stage, error: DetectorError },
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    fn log_entry_fields(&self) -> (String, usize, Option<String>, Option<String>) {
        match self {
            Self::Completed(report) => {
                let outcome = match report.publish {
                    PublishOutcome::NothingToPublish => "nothing_to_publish",
                    PublishOutcome::Published { .. } => "published",
                };
                (outcome.to_string(), report.violators.len(), None, None)
            }
            Self::Failed { stage, error } => (
                "failed".to_string(),
                0,
                Some(stage.name().to_string()),
                Some(error.to_string()),
            ),
        }
    }
}

/// Sessions that can record their own cycle outcome.
pub trait CycleJournal {
    fn record_cycle(&self, entry: &CycleLogEntry) -> crate::error::DetectorResult<()>;
}

impl CycleJournal for Store {
    fn record_cycle(&self, entry: &CycleLogEntry) -> crate::error::DetectorResult<()> {
        self.append_cycle_log(entry)
    }
}

pub struct Scheduler<C: StoreConnector> {
    connector: C,
    config: DetectorConfig,
    state: SchedulerState,
    cycles_run: u64,
    cycles_failed: u64,
}

impl<C> Scheduler<C>
where
    C: StoreConnector,
    C::Session: CycleJournal,
{
    /// Fails with `InvalidConfig` rather than accepting settings that
    /// would break every cycle.
    pub fn new(connector: C, config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            config,
            state: SchedulerState::Idle,
            cycles_run: 0,
            cycles_failed: 0,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed
    }

    /// Run exactly one cycle. Acquires a store session, runs the pipeline,
    /// records the outcome and releases the session. Never returns an error.
    pub fn run_once(&mut self) -> CycleOutcome {
        self.state = SchedulerState::Running;
        let cycle_id: CycleId = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        log::info!("Cycle {cycle_id} started");

        let outcome = match self.connector.connect() {
            Ok(session) => {
                let outcome = match run_cycle(&session, &self.config) {
                    Ok(report) => CycleOutcome::Completed(report),
                    Err(error) => CycleOutcome::Failed { stage: error.stage(), error },
                };
                let (label, violators, failed_stage, message) = outcome.log_entry_fields();
                let entry = CycleLogEntry {
                    cycle_id: cycle_id.clone(),
                    started_at,
                    finished_at: Utc::now(),
                    outcome: label,
                    violators,
                    failed_stage,
                    message,
                };
                if let Err(e) = session.record_cycle(&entry) {
                    log::warn!("Cycle {cycle_id}: could not write cycle log: {e}");
                }
                outcome
                // session dropped here; connection closed
            }
            Err(error) => CycleOutcome::Failed { stage: Stage::Store, error },
        };

        self.cycles_run += 1;
        match &outcome {
            CycleOutcome::Completed(report) => log::info!(
                "Cycle {cycle_id} finished: {} violators, {:?}",
                report.violators.len(),
                report.publish
            ),
            CycleOutcome::Failed { stage, error } => {
                self.cycles_failed += 1;
                log::error!("Cycle {cycle_id} failed at {stage}: {error}");
            }
        }
        self.state = SchedulerState::Idle;
        outcome
    }

    /// Run `n` cycles, sleeping the configured interval between them.
    pub fn run_cycles(&mut self, n: u64) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(n as usize);
        for i in 0..n {
            outcomes.push(self.run_once());
            if i + 1 < n {
                self.sleep();
            }
        }
        outcomes
    }

    pub fn run_forever(&mut self) -> ! {
        loop {
            self.run_once();
            self.sleep();
        }
    }

    fn sleep(&self) {
        let interval = self.config.interval();
        log::info!("Waiting {} seconds until the next cycle", interval.as_secs());
        std::thread::sleep(interval);
    }
}
