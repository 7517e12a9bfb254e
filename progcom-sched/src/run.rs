//! Scheduling run state machine
//!
//! A run progresses Collecting → Building → Writing → Solving → Loading →
//! Emitting; any stage may fail. Solver exchange files live in a per-run
//! temporary directory that is removed on success and preserved for
//! inspection on failure.

use std::fmt;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use progcom_common::{Error, Result};

use crate::grid::{ScheduleGrid, TalkInput, Timetable};
use crate::lp::write_lp;
use crate::model::ScheduleModel;
use crate::params::ScheduleParams;
use crate::solver::{run_solver, SolverConfig};

/// Stage of a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Collecting,
    Building,
    Writing,
    Solving,
    Loading,
    Emitting,
    Emitted,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Collecting => "collecting",
            RunState::Building => "building",
            RunState::Writing => "writing",
            RunState::Solving => "solving",
            RunState::Loading => "loading",
            RunState::Emitting => "emitting",
            RunState::Emitted => "emitted",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub timetable: Timetable,
    pub objective: Option<f64>,
}

/// Drives one scheduling run from inputs to a timetable.
pub struct ScheduleRun {
    solver: SolverConfig,
    state: RunState,
    /// Exchange files preserved after a failure.
    preserved_dir: Option<PathBuf>,
}

impl ScheduleRun {
    pub fn new(solver: SolverConfig) -> ScheduleRun {
        ScheduleRun {
            solver,
            state: RunState::Collecting,
            preserved_dir: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Directory with the model and solution files of a failed run.
    pub fn preserved_dir(&self) -> Option<&std::path::Path> {
        self.preserved_dir.as_deref()
    }

    fn transition(&mut self, next: RunState) {
        tracing::info!(from = %self.state, to = %next, "scheduling run transition");
        self.state = next;
    }

    /// Execute the full pipeline. An empty talk set short-circuits to an
    /// empty timetable without invoking the solver.
    pub async fn execute(
        &mut self,
        grid: &ScheduleGrid,
        talks: &[TalkInput],
        params: &ScheduleParams,
        cancel: &CancellationToken,
    ) -> Result<ScheduleOutcome> {
        match self.run_stages(grid, talks, params, cancel).await {
            Ok(outcome) => {
                self.transition(RunState::Emitted);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &mut self,
        grid: &ScheduleGrid,
        talks: &[TalkInput],
        params: &ScheduleParams,
        cancel: &CancellationToken,
    ) -> Result<ScheduleOutcome> {
        self.transition(RunState::Building);
        let model = ScheduleModel::build(grid, talks, params)?;

        if talks.is_empty() {
            tracing::info!("no talks to schedule");
            return Ok(ScheduleOutcome {
                timetable: Timetable::default(),
                objective: None,
            });
        }

        self.transition(RunState::Writing);
        let workdir = tempfile::Builder::new()
            .prefix("progcom-sched-")
            .tempdir()
            .map_err(Error::Io)?;
        let model_path = workdir.path().join("schedule.lp");
        let solution_path = workdir.path().join("schedule.sol");
        tokio::fs::write(&model_path, write_lp(model.mip()))
            .await
            .map_err(Error::Io)?;

        self.transition(RunState::Solving);
        let solution = match run_solver(&self.solver, &model_path, &solution_path, cancel).await {
            Ok(solution) => solution,
            Err(e) => {
                // Keep the exchange files around for inspection.
                let preserved = workdir.into_path();
                tracing::warn!(dir = %preserved.display(), "run failed, exchange files preserved");
                self.preserved_dir = Some(preserved);
                return Err(e);
            }
        };

        self.transition(RunState::Loading);
        let timetable = match model.decode(&solution.values, grid) {
            Ok(timetable) => timetable,
            Err(e) => {
                let preserved = workdir.into_path();
                tracing::warn!(dir = %preserved.display(), "solution rejected, exchange files preserved");
                self.preserved_dir = Some(preserved);
                return Err(e);
            }
        };

        self.transition(RunState::Emitting);
        if let Err(e) = timetable.validate(talks) {
            let preserved = workdir.into_path();
            tracing::warn!(dir = %preserved.display(), "timetable invalid, exchange files preserved");
            self.preserved_dir = Some(preserved);
            return Err(e);
        }

        tracing::info!(
            talks = timetable.len(),
            objective = ?solution.objective,
            "timetable emitted"
        );
        // Dropping the tempdir removes the exchange files on success.
        drop(workdir);

        Ok(ScheduleOutcome {
            timetable,
            objective: solution.objective,
        })
    }
}
