//! Speaker wire type

use serde::{Deserialize, Serialize};

use crate::expand::Expandable;
use crate::types::question::Answer;
use crate::types::room::AvailabilityWindow;

/// A speaker profile within an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Opaque short identifier, unique within the event.
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Codes of the proposals this speaker is attached to.
    #[serde(default)]
    pub submissions: Vec<String>,
    #[serde(default)]
    pub answers: Option<Vec<Expandable<i64, Answer>>>,
    #[serde(default)]
    pub availabilities: Option<Vec<AvailabilityWindow>>,
}
