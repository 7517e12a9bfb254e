//! Flat row projections of wire records
//!
//! Pure transformations from expanded wire records into row-per-entity
//! tables, the shape the assignment and scheduling inputs are built from.
//! Track names split into a main and sub track on the first colon.

use chrono::{DateTime, Utc};

use progcom_common::types::{Proposal, ProposalState, Review, Speaker};

/// One row per proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRow {
    pub code: String,
    pub title: String,
    pub state: ProposalState,
    pub pending_state: Option<ProposalState>,
    pub track: Option<String>,
    pub main_track: Option<String>,
    pub sub_track: Option<String>,
    pub submission_type: String,
    pub duration: u32,
    pub created: Option<DateTime<Utc>>,
    pub speaker_codes: Vec<String>,
    pub speaker_names: Vec<String>,
}

/// One row per (proposal, speaker) pair, the exploded form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalSpeakerRow {
    pub code: String,
    pub title: String,
    pub track: Option<String>,
    pub duration: u32,
    pub speaker_code: String,
    pub speaker_name: String,
}

/// One row per speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerRow {
    pub code: String,
    pub name: String,
    pub proposal_codes: Vec<String>,
}

/// One row per review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub id: i64,
    pub proposal: String,
    pub reviewer: String,
    pub score: Option<f64>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Split a track name into main and sub track on the first colon.
pub fn split_track(name: &str) -> (String, Option<String>) {
    match name.split_once(':') {
        Some((main, sub)) => (main.trim().to_string(), Some(sub.trim().to_string())),
        None => (name.trim().to_string(), None),
    }
}

/// Project proposals into rows. Records must be expanded; unresolved
/// references degrade to empty columns.
pub fn proposal_rows(proposals: &[Proposal]) -> Vec<ProposalRow> {
    proposals
        .iter()
        .map(|p| {
            let track = p.track_name().map(String::from);
            let (main_track, sub_track) = match &track {
                Some(name) => {
                    let (main, sub) = split_track(name);
                    (Some(main), sub)
                }
                None => (None, None),
            };
            let speakers: Vec<(&str, &str)> = p
                .speakers
                .iter()
                .filter_map(|s| s.full())
                .map(|s| (s.code.as_str(), s.name.as_str()))
                .collect();
            ProposalRow {
                code: p.code.clone(),
                title: p.title.clone(),
                state: p.state,
                pending_state: p.pending_state,
                track,
                main_track,
                sub_track,
                submission_type: p.submission_type_name().unwrap_or_default().to_string(),
                duration: p.duration,
                created: p.created,
                speaker_codes: speakers.iter().map(|(c, _)| c.to_string()).collect(),
                speaker_names: speakers.iter().map(|(_, n)| n.to_string()).collect(),
            }
        })
        .collect()
}

/// Explode proposal rows into one row per speaker.
pub fn explode_by_speaker(rows: &[ProposalRow]) -> Vec<ProposalSpeakerRow> {
    rows.iter()
        .flat_map(|row| {
            row.speaker_codes
                .iter()
                .zip(row.speaker_names.iter())
                .map(move |(code, name)| ProposalSpeakerRow {
                    code: row.code.clone(),
                    title: row.title.clone(),
                    track: row.track.clone(),
                    duration: row.duration,
                    speaker_code: code.clone(),
                    speaker_name: name.clone(),
                })
        })
        .collect()
}

/// Re-implode exploded rows, grouping by proposal code in first-seen
/// order.
pub fn implode_speakers(rows: &[ProposalSpeakerRow]) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::BTreeMap<String, Vec<String>> = Default::default();
    for row in rows {
        if !grouped.contains_key(&row.code) {
            order.push(row.code.clone());
        }
        grouped
            .entry(row.code.clone())
            .or_default()
            .push(row.speaker_code.clone());
    }
    order
        .into_iter()
        .map(|code| {
            let speakers = grouped.remove(&code).unwrap_or_default();
            (code, speakers)
        })
        .collect()
}

pub fn speaker_rows(speakers: &[Speaker]) -> Vec<SpeakerRow> {
    speakers
        .iter()
        .map(|s| SpeakerRow {
            code: s.code.clone(),
            name: s.name.clone(),
            proposal_codes: s.submissions.clone(),
        })
        .collect()
}

pub fn review_rows(reviews: &[Review]) -> Vec<ReviewRow> {
    reviews
        .iter()
        .map(|r| ReviewRow {
            id: r.id,
            proposal: r.submission.clone(),
            reviewer: r.user.clone(),
            score: r.score,
            created: r.created,
            updated: r.updated,
        })
        .collect()
}
