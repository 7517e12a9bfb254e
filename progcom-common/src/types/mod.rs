//! Wire types for the CfP service
//!
//! Value objects mirroring the upstream JSON schema under the pinned API
//! version. All types are immutable within a session; the client's
//! expansion cache holds auxiliary records (tracks, submission types,
//! speakers, answers) until cleared.

mod event;
mod me;
mod proposal;
mod question;
mod review;
mod room;
mod speaker;
mod track;

pub use event::Event;
pub use me::Me;
pub use proposal::{Proposal, ProposalSpeaker, ProposalState, ProposalUrls, TalkSlot};
pub use question::{Answer, Question, QuestionOption, QuestionTarget};
pub use review::Review;
pub use room::{AvailabilityWindow, Room};
pub use speaker::Speaker;
pub use track::{SubmissionType, Tag, Track};
