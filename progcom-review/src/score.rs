//! Score aggregation with reviewer bias correction
//!
//! Reviewers calibrate differently: some score everything high, some low.
//! The debiased score of a review is the raw score minus the reviewer's
//! personal mean; a proposal's aggregate is the mean of its debiased
//! scores. Public votes use a separate scale where 1 means "indifferent"
//! and is discarded, 2 normalizes to 1 and higher categories dominate.

use std::collections::BTreeMap;

use crate::tables::ReviewRow;

/// A single review with its bias-corrected score.
#[derive(Debug, Clone, PartialEq)]
pub struct DebiasedReview {
    pub proposal: String,
    pub reviewer: String,
    pub raw: f64,
    pub debiased: f64,
}

/// Mean raw score per reviewer, over scored reviews only.
pub fn reviewer_means(rows: &[ReviewRow]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for row in rows {
        if let Some(score) = row.score {
            let entry = sums.entry(row.reviewer.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(reviewer, (sum, n))| (reviewer, sum / f64::from(n)))
        .collect()
}

/// Debias every scored review against its reviewer's mean.
pub fn debiased_reviews(rows: &[ReviewRow]) -> Vec<DebiasedReview> {
    let means = reviewer_means(rows);
    rows.iter()
        .filter_map(|row| {
            let raw = row.score?;
            let mean = means.get(&row.reviewer).copied().unwrap_or(0.0);
            Some(DebiasedReview {
                proposal: row.proposal.clone(),
                reviewer: row.reviewer.clone(),
                raw,
                debiased: raw - mean,
            })
        })
        .collect()
}

/// Aggregate score per proposal: the mean of its debiased review scores.
pub fn aggregate_scores(rows: &[ReviewRow]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for review in debiased_reviews(rows) {
        let entry = sums.entry(review.proposal).or_insert((0.0, 0));
        entry.0 += review.debiased;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(proposal, (sum, n))| (proposal, sum / f64::from(n)))
        .collect()
}

/// Number of scored reviews per proposal.
pub fn completed_reviews(rows: &[ReviewRow]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for row in rows {
        if row.score.is_some() {
            *counts.entry(row.proposal.clone()).or_default() += 1;
        }
    }
    counts
}

/// Contribution of one public vote: 1 is indifferent and discarded, 2
/// normalizes to 1, higher categories keep their value.
pub fn vote_value(vote: u32) -> u32 {
    match vote {
        0 | 1 => 0,
        2 => 1,
        n => n,
    }
}

/// Vote score per proposal: the sum of normalized vote values.
pub fn vote_scores(votes: &[(String, u32)]) -> BTreeMap<String, u32> {
    let mut scores: BTreeMap<String, u32> = BTreeMap::new();
    for (proposal, vote) in votes {
        *scores.entry(proposal.clone()).or_default() += vote_value(*vote);
    }
    scores
}
