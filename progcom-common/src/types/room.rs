//! Room wire type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::localized::LocalizedString;

/// A window during which a room or speaker is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A physical room of the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    /// Seating capacity; zero when unknown.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Ordering hint for schedule displays.
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub availabilities: Option<Vec<AvailabilityWindow>>,
}
