//! # Progcom Review
//!
//! Review-phase tooling:
//! - [`tables`]: flat row projections of wire records
//! - [`score`]: reviewer bias correction and public-vote aggregation
//! - [`assign`]: deterministic greedy reviewer assignment
//! - [`export`]: the JSON upload artifact for the upstream's
//!   bulk-assignment endpoint

pub mod assign;
pub mod export;
pub mod score;
pub mod tables;

pub use assign::{assign_proposals, AssignmentOptions, ProposalForReview, Reviewer};
pub use export::Assignment;
