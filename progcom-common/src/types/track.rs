//! Track, submission type and tag wire types

use serde::{Deserialize, Serialize};

use crate::localized::LocalizedString;

/// Taxonomic grouping of proposals.
///
/// By convention the English name encodes a main and sub track separated by
/// the first colon, e.g. `"PyData: Machine Learning"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub name: LocalizedString,
}

/// Kind of submission (talk, tutorial, keynote, sponsored slot, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionType {
    pub id: i64,
    pub name: LocalizedString,
}

/// Free-form organizer tag on proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: Option<i64>,
    pub tag: String,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub color: Option<String>,
}
