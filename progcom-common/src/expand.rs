//! Reference-or-record wrapper for drifting wire formats
//!
//! Newer versions of the CfP wire format replace nested objects with plain
//! identifier references (a proposal carries a track id instead of a track
//! object). `Expandable` captures both shapes; the client's expansion layer
//! rewrites references into full records before callers see them, so
//! downstream code can rely on [`Expandable::full`]. The reverse direction
//! is not supported: writers always send identifier references.

use serde::{Deserialize, Serialize};

/// Either an identifier reference or the full record it points at.
///
/// Deserialization prefers the full record: an object parses as `Full`, a
/// bare identifier as `Ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<Id, T> {
    Full(T),
    Ref(Id),
}

impl<Id, T> Expandable<Id, T> {
    pub fn is_ref(&self) -> bool {
        matches!(self, Expandable::Ref(_))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Expandable::Full(_))
    }

    /// The full record, if already expanded.
    pub fn full(&self) -> Option<&T> {
        match self {
            Expandable::Full(record) => Some(record),
            Expandable::Ref(_) => None,
        }
    }

    /// The raw reference, if not yet expanded.
    pub fn reference(&self) -> Option<&Id> {
        match self {
            Expandable::Ref(id) => Some(id),
            Expandable::Full(_) => None,
        }
    }

    pub fn into_full(self) -> Option<T> {
        match self {
            Expandable::Full(record) => Some(record),
            Expandable::Ref(_) => None,
        }
    }
}
