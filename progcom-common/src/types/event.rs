//! Event wire type

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::localized::LocalizedString;

/// A conference edition hosted on the CfP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// URL slug identifying the event, e.g. `"pycon-2026"`.
    pub slug: String,
    pub name: LocalizedString,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialize() {
        let json = r#"{
            "slug": "pycon-2026",
            "name": {"en": "PyCon 2026"},
            "date_from": "2026-04-23",
            "date_to": "2026-04-25",
            "timezone": "Europe/Berlin",
            "is_public": true
        }"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert_eq!(e.slug, "pycon-2026");
        assert_eq!(
            e.date_from,
            Some(NaiveDate::from_ymd_opt(2026, 4, 23).unwrap())
        );
        assert!(e.is_public);
    }
}
