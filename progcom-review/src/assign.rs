//! Greedy reviewer assignment
//!
//! Distributes proposals to reviewers respecting track preferences, target
//! review counts, reviews already done and a "wants all proposals" opt-in.
//! Output is deterministic: ties on workload break by the reviewers' input
//! order, proposals are processed in a stable order, and identical inputs
//! produce byte-identical output.
//!
//! Submission tracks and reviewer preference tracks drift apart over the
//! years; a caller-supplied alias table maps one taxonomy onto the other
//! and coverage is validated before anything is assigned.

use std::collections::{BTreeMap, BTreeSet};

use progcom_common::{Error, Result};

use crate::export::Assignment;

/// A proposal as seen by the assignment engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalForReview {
    pub code: String,
    /// Track name after projection; proposals without a track fall back to
    /// least-loaded assignment.
    pub track: Option<String>,
    pub target_reviews: u32,
    pub completed_reviews: u32,
}

/// A reviewer with preferences and history.
#[derive(Debug, Clone, PartialEq)]
pub struct Reviewer {
    pub name: String,
    pub email: String,
    pub track_prefs: Vec<String>,
    /// Codes of proposals already reviewed or assigned.
    pub current_assignments: Vec<String>,
    /// Opt-in to receive every proposal after the balanced pass.
    pub wants_all: bool,
}

/// Tuning knobs for an assignment run.
#[derive(Debug, Clone)]
pub struct AssignmentOptions {
    /// Extra reviewers assigned beyond the target to tolerate no-shows.
    pub buffer: u32,
    /// Maps submission track names onto reviewer preference track names.
    pub track_aliases: BTreeMap<String, String>,
}

impl Default for AssignmentOptions {
    fn default() -> Self {
        AssignmentOptions {
            buffer: 2,
            track_aliases: BTreeMap::new(),
        }
    }
}

fn apply_alias<'a>(aliases: &'a BTreeMap<String, String>, track: &'a str) -> &'a str {
    aliases.get(track).map(String::as_str).unwrap_or(track)
}

/// Assign proposals to reviewers.
///
/// Proposals whose completed reviews already meet the target receive no
/// new assignments. The result holds one entry per reviewer, in input
/// order, with the reviewer's full assignment list (pre-existing
/// assignments included).
pub fn assign_proposals(
    proposals: &[ProposalForReview],
    reviewers: &[Reviewer],
    options: &AssignmentOptions,
) -> Result<Vec<Assignment>> {
    let aliased_tracks: Vec<Option<String>> = proposals
        .iter()
        .map(|p| {
            p.track
                .as_deref()
                .map(|t| apply_alias(&options.track_aliases, t).to_string())
        })
        .collect();
    let aliased_prefs: Vec<BTreeSet<String>> = reviewers
        .iter()
        .map(|r| {
            r.track_prefs
                .iter()
                .map(|t| apply_alias(&options.track_aliases, t).to_string())
                .collect()
        })
        .collect();

    check_track_coverage(&aliased_tracks, &aliased_prefs)?;

    // Workload state, seeded with what each reviewer already has.
    let mut assignments: Vec<Vec<String>> = reviewers
        .iter()
        .map(|r| r.current_assignments.clone())
        .collect();
    let mut loads: Vec<usize> = assignments.iter().map(Vec::len).collect();

    // How many times each proposal is already assigned to anyone.
    let mut already_assigned: BTreeMap<&str, i64> = BTreeMap::new();
    for list in &assignments {
        for code in list {
            *already_assigned.entry(code.as_str()).or_default() += 1;
        }
    }

    // Remaining demand per proposal: target minus completed (clipped at
    // zero), plus the buffer, minus assignments already handed out. A
    // fully reviewed proposal stays at zero.
    let mut remaining: Vec<i64> = proposals
        .iter()
        .map(|p| {
            let outstanding = i64::from(p.target_reviews.saturating_sub(p.completed_reviews));
            if outstanding == 0 {
                0
            } else {
                outstanding + i64::from(options.buffer)
                    - already_assigned.get(p.code.as_str()).copied().unwrap_or(0)
            }
        })
        .collect();

    // Most-demanded proposals first; stable sort keeps input order on ties.
    let mut order: Vec<usize> = (0..proposals.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(remaining[i]));

    while remaining.iter().any(|&r| r > 0) {
        for &idx in &order {
            if remaining[idx] <= 0 {
                continue;
            }
            let proposal = &proposals[idx];
            let track = aliased_tracks[idx].as_deref();

            match pick_reviewer(&proposal.code, track, &aliased_prefs, &assignments, &loads) {
                Some(reviewer_idx) => {
                    assignments[reviewer_idx].push(proposal.code.clone());
                    loads[reviewer_idx] += 1;
                    remaining[idx] -= 1;
                }
                None => {
                    // Every reviewer already has this proposal; the pool
                    // bounds the coverage.
                    tracing::warn!(
                        proposal = %proposal.code,
                        "reviewer pool exhausted, dropping remaining demand"
                    );
                    remaining[idx] = 0;
                }
            }
        }
    }

    // Opt-in reviewers receive the full proposal list after the balanced
    // pass, without duplicating what they already have.
    for (reviewer_idx, reviewer) in reviewers.iter().enumerate() {
        if !reviewer.wants_all {
            continue;
        }
        let have: BTreeSet<&str> = assignments[reviewer_idx]
            .iter()
            .map(String::as_str)
            .collect();
        let missing: Vec<String> = proposals
            .iter()
            .filter(|p| !have.contains(p.code.as_str()))
            .map(|p| p.code.clone())
            .collect();
        tracing::info!(
            reviewer = %reviewer.email,
            added = missing.len(),
            "assigning full proposal list to opt-in reviewer"
        );
        assignments[reviewer_idx].extend(missing);
    }

    Ok(reviewers
        .iter()
        .zip(assignments)
        .map(|(reviewer, proposals)| Assignment {
            email: reviewer.email.clone(),
            proposals,
        })
        .collect())
}

/// Pick the least-loaded reviewer for a proposal: preference-matching
/// reviewers first, then any reviewer not yet holding the proposal. Ties
/// break by input order. `None` when every reviewer already has it.
fn pick_reviewer(
    code: &str,
    track: Option<&str>,
    prefs: &[BTreeSet<String>],
    assignments: &[Vec<String>],
    loads: &[usize],
) -> Option<usize> {
    let eligible = |i: usize| !assignments[i].iter().any(|c| c == code);

    let preferred = (0..prefs.len())
        .filter(|&i| eligible(i))
        .filter(|&i| track.map(|t| prefs[i].contains(t)).unwrap_or(false))
        .min_by_key(|&i| loads[i]);
    if preferred.is_some() {
        return preferred;
    }

    if let Some(track) = track {
        tracing::warn!(proposal = code, track, "no preferred reviewer available");
    } else {
        tracing::warn!(proposal = code, "proposal has no track, using least-loaded reviewer");
    }

    (0..prefs.len()).filter(|&i| eligible(i)).min_by_key(|&i| loads[i])
}

/// Validate that the two track taxonomies cover each other after
/// aliasing.
fn check_track_coverage(
    proposal_tracks: &[Option<String>],
    reviewer_prefs: &[BTreeSet<String>],
) -> Result<()> {
    let in_proposals: BTreeSet<&str> = proposal_tracks
        .iter()
        .filter_map(|t| t.as_deref())
        .collect();
    let in_prefs: BTreeSet<&str> = reviewer_prefs
        .iter()
        .flat_map(|set| set.iter().map(String::as_str))
        .collect();

    let only_in_proposals: Vec<String> = in_proposals
        .difference(&in_prefs)
        .map(|s| s.to_string())
        .collect();
    let only_in_reviewers: Vec<String> = in_prefs
        .difference(&in_proposals)
        .map(|s| s.to_string())
        .collect();

    if !only_in_proposals.is_empty() {
        return Err(Error::TrackMismatch {
            only_in_proposals,
            only_in_reviewers,
        });
    }
    if !only_in_reviewers.is_empty() {
        tracing::warn!(?only_in_reviewers, "unused reviewer track preferences");
    }
    Ok(())
}
