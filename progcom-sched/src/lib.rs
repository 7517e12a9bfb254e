//! # Progcom Sched
//!
//! Lays out accepted talks across days, sessions, slots and rooms as a
//! mixed-integer program:
//! - [`grid`]: the slot grid, talk inputs and the resulting timetable
//! - [`params`]: popularity/capacity fit, co-vote dispersion and speaker
//!   preference parameters
//! - [`linexpr`]: the small linear-expression layer the model is built
//!   from
//! - [`model`]: decision variables, constraints and the staged objective
//! - [`lp`]: LP-format writer and reader for the solver exchange
//! - [`solver`]: out-of-process solver invocation and solution parsing
//! - [`run`]: the scheduling run state machine

pub mod grid;
pub mod linexpr;
pub mod lp;
pub mod model;
pub mod params;
pub mod run;
pub mod solver;

pub use grid::{RoomSpec, ScheduleGrid, ScheduledSlot, SlotKey, TalkInput, Timetable};
pub use model::ScheduleModel;
pub use params::ScheduleParams;
pub use run::{RunState, ScheduleOutcome, ScheduleRun};
pub use solver::{SolveStatus, SolverConfig};
