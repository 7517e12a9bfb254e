//! Review wire type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single review of a proposal.
///
/// `user` is the reviewer's user code where the upstream exposes one, or a
/// free-form name consistent within one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    /// Code of the reviewed proposal.
    pub submission: String,
    pub user: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Numeric score; absent while the review is still a draft.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}
