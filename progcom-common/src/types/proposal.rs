//! Proposal (talk submission) wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expand::Expandable;
use crate::localized::LocalizedString;
use crate::types::question::Answer;
use crate::types::track::{SubmissionType, Track};

/// Lifecycle state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Submitted,
    Accepted,
    Confirmed,
    Rejected,
    Withdrawn,
    Canceled,
    Deleted,
}

impl ProposalState {
    /// States that appear in the public schedule.
    pub fn is_accepted(self) -> bool {
        matches!(self, ProposalState::Accepted | ProposalState::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalState::Submitted => "submitted",
            ProposalState::Accepted => "accepted",
            ProposalState::Confirmed => "confirmed",
            ProposalState::Rejected => "rejected",
            ProposalState::Withdrawn => "withdrawn",
            ProposalState::Canceled => "canceled",
            ProposalState::Deleted => "deleted",
        }
    }
}

/// Speaker reference embedded in a proposal.
///
/// Newer wire versions send bare speaker codes here; the expansion layer
/// rewrites them into this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalSpeaker {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Links the upstream exposes for a proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalUrls {
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub edit: Option<String>,
    #[serde(default)]
    pub review: Option<String>,
}

/// Slot data attached to scheduled talks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkSlot {
    #[serde(default)]
    pub room: Option<LocalizedString>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// A talk submission in any lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Opaque short identifier, unique per event.
    pub code: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub submission_type: Expandable<i64, SubmissionType>,
    /// Identifier kept alongside the expanded record for callers that
    /// write references back.
    #[serde(default)]
    pub submission_type_id: Option<i64>,
    #[serde(default)]
    pub track: Option<Expandable<i64, Track>>,
    pub state: ProposalState,
    #[serde(default)]
    pub pending_state: Option<ProposalState>,
    /// Planned duration in minutes; always positive.
    pub duration: u32,
    #[serde(default)]
    pub speakers: Vec<Expandable<String, ProposalSpeaker>>,
    #[serde(default)]
    pub answers: Option<Vec<Expandable<i64, Answer>>>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub content_locale: Option<String>,
    #[serde(default)]
    pub urls: Option<ProposalUrls>,
    #[serde(default)]
    pub slot: Option<TalkSlot>,
}

impl Proposal {
    /// Track name in English, when the track is present and expanded.
    pub fn track_name(&self) -> Option<&str> {
        self.track
            .as_ref()
            .and_then(Expandable::full)
            .and_then(|t| t.name.en())
    }

    /// Submission type name in English, when expanded.
    pub fn submission_type_name(&self) -> Option<&str> {
        self.submission_type.full().and_then(|t| t.name.en())
    }

    /// Codes of all referenced speakers, expanded or not.
    pub fn speaker_codes(&self) -> Vec<&str> {
        self.speakers
            .iter()
            .map(|s| match s {
                Expandable::Full(speaker) => speaker.code.as_str(),
                Expandable::Ref(code) => code.as_str(),
            })
            .collect()
    }
}
