//! Wire-format tests against realistic response fixtures
//!
//! Covers both wire generations: the nested-object form and the
//! identifier-reference form that replaced it.

use progcom_common::types::{Proposal, ProposalState, Review, Room, Speaker};
use progcom_common::{Expandable, LocalizedString};

#[test]
fn test_full_proposal_nested_form() {
    let json = r#"{
        "code": "QWERT",
        "title": "Streaming pipelines that do not fall over",
        "abstract": "Lessons from three years of on-call.",
        "description": "Long form description.",
        "submission_type": {"id": 2, "name": {"en": "Talk", "de": "Vortrag"}},
        "track": {"id": 7, "name": {"en": "PyData: Machine Learning"}},
        "state": "submitted",
        "pending_state": null,
        "duration": 45,
        "speakers": [
            {"code": "SPK01", "name": "Ada Lovelace"},
            {"code": "SPK02", "name": "Grace Hopper"}
        ],
        "created": "2026-01-02T09:30:00Z",
        "is_featured": false,
        "content_locale": "en",
        "urls": {"base": "https://cfp.example.org/talk/QWERT/"}
    }"#;

    let proposal: Proposal = serde_json::from_str(json).unwrap();
    assert_eq!(proposal.code, "QWERT");
    assert_eq!(proposal.state, ProposalState::Submitted);
    assert_eq!(proposal.duration, 45);
    assert_eq!(proposal.track_name(), Some("PyData: Machine Learning"));
    assert_eq!(
        proposal.submission_type.full().unwrap().name.get("de"),
        Some("Vortrag")
    );
    assert_eq!(proposal.speaker_codes(), vec!["SPK01", "SPK02"]);
    assert_eq!(
        proposal.urls.unwrap().base.as_deref(),
        Some("https://cfp.example.org/talk/QWERT/")
    );
}

#[test]
fn test_full_proposal_reference_form() {
    let json = r#"{
        "code": "QWERT",
        "title": "Streaming pipelines that do not fall over",
        "submission_type": 2,
        "track": 7,
        "state": "accepted",
        "pending_state": "confirmed",
        "duration": 45,
        "speakers": ["SPK01", "SPK02"],
        "answers": [11, 12]
    }"#;

    let proposal: Proposal = serde_json::from_str(json).unwrap();
    assert!(proposal.submission_type.is_ref());
    assert_eq!(proposal.track.as_ref().unwrap().reference(), Some(&7));
    assert_eq!(proposal.pending_state, Some(ProposalState::Confirmed));
    let answers = proposal.answers.unwrap();
    assert!(answers.iter().all(Expandable::is_ref));
}

#[test]
fn test_proposal_roundtrips() {
    let json = r#"{
        "code": "QWERT",
        "title": "t",
        "submission_type": {"id": 2, "name": {"en": "Talk"}},
        "state": "submitted",
        "duration": 30
    }"#;
    let proposal: Proposal = serde_json::from_str(json).unwrap();
    let serialized = serde_json::to_string(&proposal).unwrap();
    let reparsed: Proposal = serde_json::from_str(&serialized).unwrap();
    assert_eq!(reparsed, proposal);
}

#[test]
fn test_speaker_with_availability() {
    let json = r#"{
        "code": "SPK01",
        "name": "Ada Lovelace",
        "biography": "Wrote the first program.",
        "submissions": ["QWERT"],
        "availabilities": [
            {"start": "2026-04-23T09:00:00Z", "end": "2026-04-23T13:00:00Z"},
            {"start": "2026-04-24T09:00:00Z", "end": "2026-04-24T18:00:00Z"}
        ]
    }"#;
    let speaker: Speaker = serde_json::from_str(json).unwrap();
    assert_eq!(speaker.availabilities.unwrap().len(), 2);
    assert_eq!(speaker.submissions, vec!["QWERT"]);
}

#[test]
fn test_review_with_free_form_reviewer() {
    // Some events only expose a display name for the reviewer.
    let json = r#"{"id": 81, "submission": "QWERT", "user": "Jane Reviewer", "score": 1.5}"#;
    let review: Review = serde_json::from_str(json).unwrap();
    assert_eq!(review.user, "Jane Reviewer");
    assert_eq!(review.score, Some(1.5));
}

#[test]
fn test_room_name_is_localized() {
    let json = r#"{"id": 3, "name": {"en": "Main Hall", "de": "Großer Saal"}, "capacity": 600}"#;
    let room: Room = serde_json::from_str(json).unwrap();
    assert_eq!(room.name.get("de"), Some("Großer Saal"));
    assert_eq!(room.name, {
        let mut expected = LocalizedString::english("Main Hall");
        expected.insert("de", "Großer Saal");
        expected
    });
}
