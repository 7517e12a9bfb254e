//! Objective parameters derived from votes, capacities and organizer
//! overrides
//!
//! Popularity and capacity are normalized into [0, 1] and discretized so
//! that the staged objective's weight gaps stay meaningful. Co-occurrence
//! counts how many voters expressed interest in two talks at once; pairs
//! of sponsored talks get an injected floor so the dispersion tier keeps
//! them apart even without vote data.

use std::collections::BTreeMap;

use crate::grid::{RoomSpec, SlotKey, TalkInput};

/// Discretization levels for normalized popularity.
pub const POPULARITY_LEVELS: u32 = 50;

/// Discretization levels for normalized co-occurrence.
pub const COOC_LEVELS: u32 = 20;

/// Injected co-occurrence floor for sponsored-talk pairs.
pub const SPONSORED_COOC_FLOOR: f64 = 0.25;

/// Clamp into [0, 1] and snap down onto `levels` discrete steps.
pub fn quantize(value: f64, levels: u32) -> f64 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * f64::from(levels)).floor() / f64::from(levels)
}

/// Speaker/room eligibility preferences per (talk, slot): -1 discourages,
/// +1 forces, 0 is neutral. The topmost objective tier makes nonzero
/// entries act as near-hard constraints.
#[derive(Debug, Clone, Default)]
pub struct Prefs {
    overrides: BTreeMap<(usize, SlotKey), i8>,
}

impl Prefs {
    pub fn set(&mut self, talk: usize, key: SlotKey, value: i8) {
        debug_assert!((-1..=1).contains(&value));
        self.overrides.insert((talk, key), value);
    }

    pub fn get(&self, talk: usize, key: SlotKey) -> i8 {
        self.overrides.get(&(talk, key)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// All derived parameters the model builder consumes.
#[derive(Debug, Clone, Default)]
pub struct ScheduleParams {
    /// `fit[talk][room]`: popularity-capacity match in [0, 1].
    pub fit: Vec<Vec<f64>>,
    /// `cooc[talk][talk]`: symmetric dispersion weights, zero diagonal.
    pub cooc: Vec<Vec<f64>>,
    pub prefs: Prefs,
    /// Multi-part talks that must run back-to-back in one room, as
    /// (first part, second part) codes.
    pub paired: Vec<(String, String)>,
}

impl ScheduleParams {
    /// Derive fit and co-occurrence from talks, rooms and per-voter
    /// interest lists.
    pub fn derive(talks: &[TalkInput], rooms: &[RoomSpec], voters: &[Vec<String>]) -> ScheduleParams {
        ScheduleParams {
            fit: fit_matrix(talks, rooms),
            cooc: cooc_matrix(talks, voters),
            prefs: Prefs::default(),
            paired: Vec::new(),
        }
    }
}

/// `fit[t][r] = quantize(norm_popularity, 50) * norm_capacity`.
pub fn fit_matrix(talks: &[TalkInput], rooms: &[RoomSpec]) -> Vec<Vec<f64>> {
    let max_popularity = talks
        .iter()
        .map(|t| t.popularity)
        .fold(0.0_f64, f64::max);
    let max_capacity = rooms.iter().map(|r| r.capacity).max().unwrap_or(0);

    talks
        .iter()
        .map(|talk| {
            let norm_popularity = if max_popularity > 0.0 {
                talk.popularity / max_popularity
            } else {
                0.0
            };
            let quantized = quantize(norm_popularity, POPULARITY_LEVELS);
            rooms
                .iter()
                .map(|room| {
                    let norm_capacity = if max_capacity > 0 {
                        f64::from(room.capacity) / f64::from(max_capacity)
                    } else {
                        0.0
                    };
                    quantized * norm_capacity
                })
                .collect()
        })
        .collect()
}

/// Symmetric co-vote dispersion weights: per-voter pair counts, zero
/// diagonal, normalized by the maximum, discretized, then squared so
/// strong overlaps dominate. Sponsored pairs get the injected floor.
pub fn cooc_matrix(talks: &[TalkInput], voters: &[Vec<String>]) -> Vec<Vec<f64>> {
    let n = talks.len();
    let index: BTreeMap<&str, usize> = talks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.code.as_str(), i))
        .collect();

    let mut counts = vec![vec![0u32; n]; n];
    for interests in voters {
        let ids: Vec<usize> = interests
            .iter()
            .filter_map(|code| index.get(code.as_str()).copied())
            .collect();
        for (a, &i) in ids.iter().enumerate() {
            for &j in ids.iter().skip(a + 1) {
                counts[i][j] += 1;
                counts[j][i] += 1;
            }
        }
    }

    let max_count = counts
        .iter()
        .flat_map(|row| row.iter())
        .copied()
        .max()
        .unwrap_or(0);

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut value = if max_count > 0 {
                let normalized = f64::from(counts[i][j]) / f64::from(max_count);
                let discrete = quantize(normalized, COOC_LEVELS);
                discrete * discrete
            } else {
                0.0
            };
            if talks[i].sponsored && talks[j].sponsored {
                value = value.max(SPONSORED_COOC_FLOOR);
            }
            matrix[i][j] = value;
        }
    }
    matrix
}
