//! The schedule MIP
//!
//! Decision variable `x[t,d,s,l,r]`: talk t occupies slot (d,s,l,r).
//! Aggregates over rooms and sessions are kept as linear expressions;
//! the co-occurrence, main-track and sub-track indicators are real
//! binaries with their linearization rows.
//!
//! The staged objective enforces a lexicographic priority through weight
//! gaps: honor per-talk preferences, match popularity to capacity,
//! disperse co-interesting talks, keep each session's main track
//! homogeneous, then its sub track.

use std::collections::{BTreeMap, HashMap};

use progcom_common::{Error, Result};

use crate::grid::{ScheduleGrid, ScheduledSlot, SlotKey, TalkInput, Timetable};
use crate::linexpr::{Constraint, LinExpr, Sense, Var};
use crate::params::ScheduleParams;

/// Objective tier weights; two orders of magnitude between tiers is
/// enough to dominate given the parameter discretization.
pub const PREF_WEIGHT: f64 = 1e8;
pub const FIT_WEIGHT: f64 = 1e6;
pub const COOC_WEIGHT: f64 = 1e4;
pub const MAIN_TRACK_WEIGHT: f64 = 1e2;
pub const SUB_TRACK_WEIGHT: f64 = 1.0;

/// A solver-agnostic MIP: named binary variables, constraint rows and a
/// maximized objective.
#[derive(Debug, Default)]
pub struct MipModel {
    var_names: Vec<String>,
    var_lookup: HashMap<String, usize>,
    pub constraints: Vec<Constraint>,
    pub objective: LinExpr,
}

impl MipModel {
    pub fn new() -> MipModel {
        MipModel::default()
    }

    /// Register a binary variable; re-registering a name returns the
    /// existing variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> Var {
        let name = name.into();
        if let Some(&index) = self.var_lookup.get(&name) {
            return Var(index);
        }
        let index = self.var_names.len();
        self.var_lookup.insert(name.clone(), index);
        self.var_names.push(name);
        Var(index)
    }

    pub fn var_by_name(&self, name: &str) -> Option<Var> {
        self.var_lookup.get(name).copied().map(Var)
    }

    pub fn name_of(&self, var: Var) -> &str {
        &self.var_names[var.index()]
    }

    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, expr: LinExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

/// The built schedule model with enough bookkeeping to decode a solution
/// back into a timetable.
#[derive(Debug)]
pub struct ScheduleModel {
    model: MipModel,
    talk_codes: Vec<String>,
    x: Vec<(usize, SlotKey, Var)>,
}

impl ScheduleModel {
    /// Assemble variables, constraints and the staged objective.
    pub fn build(
        grid: &ScheduleGrid,
        talks: &[TalkInput],
        params: &ScheduleParams,
    ) -> Result<ScheduleModel> {
        let mut seen = std::collections::BTreeSet::new();
        for talk in talks {
            if !seen.insert(talk.code.as_str()) {
                return Err(Error::NoSchedule(format!(
                    "duplicate talk code {} in optimizer input",
                    talk.code
                )));
            }
            if talk.duration == 0 {
                return Err(Error::NoSchedule(format!(
                    "talk {} has zero duration",
                    talk.code
                )));
            }
        }

        let mut model = MipModel::new();
        let slots = grid.existing_slots();

        // x[t,d,s,l,r] over existing slots.
        let mut x: Vec<(usize, SlotKey, Var)> = Vec::with_capacity(talks.len() * slots.len());
        let mut by_talk: Vec<Vec<(SlotKey, Var)>> = vec![Vec::new(); talks.len()];
        let mut by_slot: BTreeMap<SlotKey, Vec<Var>> = BTreeMap::new();
        for (t, _talk) in talks.iter().enumerate() {
            for &key in &slots {
                let var = model.add_binary(x_name(t, key));
                x.push((t, key, var));
                by_talk[t].push((key, var));
                by_slot.entry(key).or_default().push(var);
            }
        }

        // Length fit and uniqueness per talk.
        for (t, talk) in talks.iter().enumerate() {
            let length = LinExpr::sum(
                by_talk[t]
                    .iter()
                    .map(|&(key, var)| (var, f64::from(grid.slot_length(key)))),
            );
            model.add_constraint(
                format!("len_t{t}"),
                length,
                Sense::Eq,
                f64::from(talk.duration),
            );

            let once = LinExpr::sum(by_talk[t].iter().map(|&(_, var)| (var, 1.0)));
            model.add_constraint(format!("once_t{t}"), once, Sense::Eq, 1.0);
        }

        // At most one talk per slot.
        for (&key, vars) in &by_slot {
            let expr = LinExpr::sum(vars.iter().map(|&var| (var, 1.0)));
            model.add_constraint(
                format!(
                    "cap_d{}_s{}_l{}_r{}",
                    key.day, key.session, key.slot, key.room
                ),
                expr,
                Sense::Le,
                1.0,
            );
        }

        // Parallel-position expressions x_par[t,d,s,l] = sum over rooms.
        let parallel_cells: Vec<(usize, usize, usize)> = {
            let mut cells: Vec<(usize, usize, usize)> = slots
                .iter()
                .map(|k| (k.day, k.session, k.slot))
                .collect();
            cells.sort_unstable();
            cells.dedup();
            cells
        };
        let x_par = |t: usize, cell: (usize, usize, usize)| -> LinExpr {
            LinExpr::sum(by_talk[t].iter().filter_map(|&(key, var)| {
                ((key.day, key.session, key.slot) == cell).then_some((var, 1.0))
            }))
        };

        // Co-occurrence indicators and their linearization, plus a hard
        // non-parallel row for sponsored pairs.
        let mut co_vars: Vec<(usize, usize, Var)> = Vec::new();
        for t1 in 0..talks.len() {
            for t2 in (t1 + 1)..talks.len() {
                let weight = params
                    .cooc
                    .get(t1)
                    .and_then(|row| row.get(t2))
                    .copied()
                    .unwrap_or(0.0);
                let sponsored_pair = talks[t1].sponsored && talks[t2].sponsored;
                if weight == 0.0 && !sponsored_pair {
                    continue;
                }
                let co = model.add_binary(format!("co_t{t1}_t{t2}"));
                co_vars.push((t1, t2, co));
                for &cell in &parallel_cells {
                    let mut expr = x_par(t1, cell);
                    expr.add_expr(&x_par(t2, cell));
                    if expr.is_empty() {
                        continue;
                    }
                    expr.add_term(co, -1.0);
                    model.add_constraint(
                        format!("co_t{t1}_t{t2}_d{}_s{}_l{}", cell.0, cell.1, cell.2),
                        expr,
                        Sense::Le,
                        1.0,
                    );
                    if sponsored_pair {
                        let mut hard = x_par(t1, cell);
                        hard.add_expr(&x_par(t2, cell));
                        model.add_constraint(
                            format!("spon_t{t1}_t{t2}_d{}_s{}_l{}", cell.0, cell.1, cell.2),
                            hard,
                            Sense::Le,
                            1.0,
                        );
                    }
                }
            }
        }

        // Track homogeneity indicators per session and room.
        let main_tracks = distinct_tracks(talks, |t| t.main_track.as_deref());
        let sub_tracks = distinct_tracks(talks, |t| t.sub_track.as_deref());
        let session_cells: Vec<(usize, usize, usize)> = {
            let mut cells: Vec<(usize, usize, usize)> = slots
                .iter()
                .map(|k| (k.day, k.session, k.room))
                .collect();
            cells.sort_unstable();
            cells.dedup();
            cells
        };
        let x_sess = |t: usize, cell: (usize, usize, usize)| -> LinExpr {
            LinExpr::sum(by_talk[t].iter().filter_map(|&(key, var)| {
                ((key.day, key.session, key.room) == cell).then_some((var, 1.0))
            }))
        };
        let slots_per_session = grid.slots_per_session() as f64;

        let mut mt_vars: Vec<Var> = Vec::new();
        for (m, track) in main_tracks.iter().enumerate() {
            let members: Vec<usize> = talks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.main_track.as_deref() == Some(track.as_str()))
                .map(|(i, _)| i)
                .collect();
            for &cell in &session_cells {
                let mut occupancy = LinExpr::new();
                for &t in &members {
                    occupancy.add_expr(&x_sess(t, cell));
                }
                if occupancy.is_empty() {
                    continue;
                }
                let mt = model.add_binary(format!("mt_d{}_s{}_r{}_m{m}", cell.0, cell.1, cell.2));
                mt_vars.push(mt);
                occupancy.add_term(mt, -slots_per_session);
                model.add_constraint(
                    format!("mtdef_d{}_s{}_r{}_m{m}", cell.0, cell.1, cell.2),
                    occupancy,
                    Sense::Le,
                    0.0,
                );
            }
        }

        let mut st_vars: Vec<Var> = Vec::new();
        for (b, track) in sub_tracks.iter().enumerate() {
            let members: Vec<usize> = talks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.sub_track.as_deref() == Some(track.as_str()))
                .map(|(i, _)| i)
                .collect();
            for &cell in &session_cells {
                let mut occupancy = LinExpr::new();
                for &t in &members {
                    occupancy.add_expr(&x_sess(t, cell));
                }
                if occupancy.is_empty() {
                    continue;
                }
                let st = model.add_binary(format!("st_d{}_s{}_r{}_b{b}", cell.0, cell.1, cell.2));
                st_vars.push(st);
                occupancy.add_term(st, -slots_per_session);
                model.add_constraint(
                    format!("stdef_d{}_s{}_r{}_b{b}", cell.0, cell.1, cell.2),
                    occupancy,
                    Sense::Le,
                    0.0,
                );
            }
        }

        // Multi-part talks: the second part directly after the first, in
        // the same session and room; the first part never in the last
        // position.
        let code_index: BTreeMap<&str, usize> = talks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.code.as_str(), i))
            .collect();
        for (first_code, second_code) in &params.paired {
            let &first = code_index.get(first_code.as_str()).ok_or_else(|| {
                Error::NoSchedule(format!("unknown paired talk code {first_code}"))
            })?;
            let &second = code_index.get(second_code.as_str()).ok_or_else(|| {
                Error::NoSchedule(format!("unknown paired talk code {second_code}"))
            })?;
            for &(key, var) in &by_talk[first] {
                let follower = SlotKey {
                    slot: key.slot + 1,
                    ..key
                };
                let follower_var = (key.slot + 1 < grid.slots_per_session())
                    .then(|| model.var_by_name(&x_name(second, follower)))
                    .flatten();
                let mut expr = LinExpr::term(var, 1.0);
                if let Some(follower_var) = follower_var {
                    expr.add_term(follower_var, -1.0);
                }
                model.add_constraint(
                    format!(
                        "pair_t{first}_t{second}_d{}_s{}_l{}_r{}",
                        key.day, key.session, key.slot, key.room
                    ),
                    expr,
                    Sense::Le,
                    0.0,
                );
            }
        }

        // Staged objective.
        let mut objective = LinExpr::new();
        for &(t, key, var) in &x {
            let pref = params.prefs.get(t, key);
            if pref != 0 {
                objective.add_term(var, PREF_WEIGHT * f64::from(pref));
            }
            let fit = params
                .fit
                .get(t)
                .and_then(|row| row.get(key.room))
                .copied()
                .unwrap_or(0.0);
            if fit != 0.0 {
                objective.add_term(var, FIT_WEIGHT * fit);
            }
        }
        for &(t1, t2, co) in &co_vars {
            let weight = params
                .cooc
                .get(t1)
                .and_then(|row| row.get(t2))
                .copied()
                .unwrap_or(0.0);
            objective.add_term(co, -(COOC_WEIGHT * weight));
        }
        for &mt in &mt_vars {
            objective.add_term(mt, -MAIN_TRACK_WEIGHT);
        }
        for &st in &st_vars {
            objective.add_term(st, -SUB_TRACK_WEIGHT);
        }
        model.objective = objective;

        tracing::info!(
            talks = talks.len(),
            slots = slots.len(),
            variables = model.num_vars(),
            constraints = model.constraints.len(),
            "schedule model built"
        );

        Ok(ScheduleModel {
            model,
            talk_codes: talks.iter().map(|t| t.code.clone()).collect(),
            x,
        })
    }

    pub fn mip(&self) -> &MipModel {
        &self.model
    }

    pub fn talk_codes(&self) -> &[String] {
        &self.talk_codes
    }

    /// Reconstruct the timetable from solved variable values.
    pub fn decode(
        &self,
        values: &HashMap<String, f64>,
        grid: &ScheduleGrid,
    ) -> Result<Timetable> {
        let mut timetable = Timetable::default();
        for &(t, key, var) in &self.x {
            let value = values
                .get(self.model.name_of(var))
                .copied()
                .unwrap_or(0.0);
            if value < 0.5 {
                continue;
            }
            let code = &self.talk_codes[t];
            let slot = ScheduledSlot {
                day: key.day,
                session: key.session,
                position: key.slot,
                room: key.room,
                room_name: grid.rooms()[key.room].name.clone(),
                minutes: grid.slot_length(key),
            };
            if timetable.entries.insert(code.clone(), slot).is_some() {
                return Err(Error::Solver(format!(
                    "solution places talk {code} in more than one slot"
                )));
            }
        }
        Ok(timetable)
    }
}

fn x_name(t: usize, key: SlotKey) -> String {
    format!(
        "x_t{t}_d{}_s{}_l{}_r{}",
        key.day, key.session, key.slot, key.room
    )
}

fn distinct_tracks<'a>(
    talks: &'a [TalkInput],
    pick: impl Fn(&'a TalkInput) -> Option<&'a str>,
) -> Vec<String> {
    let mut tracks: Vec<String> = talks
        .iter()
        .filter_map(|t| pick(t).map(String::from))
        .collect();
    tracks.sort_unstable();
    tracks.dedup();
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RoomSpec;
    use crate::params::Prefs;

    fn single_room_grid(lengths: &[u32]) -> ScheduleGrid {
        let mut grid = ScheduleGrid::new(
            1,
            1,
            lengths.len(),
            vec![RoomSpec {
                name: "Main".to_string(),
                capacity: 100,
            }],
        );
        for (l, &minutes) in lengths.iter().enumerate() {
            grid.set_slot_length(
                SlotKey {
                    day: 0,
                    session: 0,
                    slot: l,
                    room: 0,
                },
                minutes,
            );
        }
        grid
    }

    fn talk(code: &str, duration: u32) -> TalkInput {
        TalkInput {
            code: code.to_string(),
            duration,
            main_track: None,
            sub_track: None,
            popularity: 0.0,
            sponsored: false,
        }
    }

    fn key(slot: usize) -> SlotKey {
        SlotKey {
            day: 0,
            session: 0,
            slot,
            room: 0,
        }
    }

    #[test]
    fn test_length_fit_constraint_coefficients() {
        let grid = single_room_grid(&[45, 30]);
        let talks = vec![talk("A", 45)];
        let built = ScheduleModel::build(&grid, &talks, &ScheduleParams::default()).unwrap();

        let len = built.model.constraint_by_name("len_t0").unwrap();
        let x45 = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        let x30 = built.model.var_by_name("x_t0_d0_s0_l1_r0").unwrap();
        assert_eq!(len.expr.coeff(x45), 45.0);
        assert_eq!(len.expr.coeff(x30), 30.0);
        assert_eq!(len.sense, Sense::Eq);
        assert_eq!(len.rhs, 45.0);

        let once = built.model.constraint_by_name("once_t0").unwrap();
        assert_eq!(once.expr.coeff(x45), 1.0);
        assert_eq!(once.expr.coeff(x30), 1.0);
        assert_eq!(once.rhs, 1.0);
    }

    #[test]
    fn test_only_matching_slot_satisfies_length_fit() {
        // A 45-minute talk with a 45- and a 30-minute slot: placing it in
        // the 45-minute slot satisfies both rows, the 30-minute slot
        // violates the length row.
        let grid = single_room_grid(&[45, 30]);
        let talks = vec![talk("A", 45)];
        let built = ScheduleModel::build(&grid, &talks, &ScheduleParams::default()).unwrap();

        let mut values = HashMap::new();
        values.insert("x_t0_d0_s0_l0_r0".to_string(), 1.0);
        let timetable = built.decode(&values, &grid).unwrap();
        assert_eq!(timetable.entries["A"].minutes, 45);
        assert!(timetable.validate(&talks).is_ok());

        let mut wrong = HashMap::new();
        wrong.insert("x_t0_d0_s0_l1_r0".to_string(), 1.0);
        let timetable = built.decode(&wrong, &grid).unwrap();
        assert!(timetable.validate(&talks).is_err());
    }

    #[test]
    fn test_slot_capacity_row() {
        let grid = single_room_grid(&[30]);
        let talks = vec![talk("A", 30), talk("B", 30)];
        let built = ScheduleModel::build(&grid, &talks, &ScheduleParams::default()).unwrap();

        let cap = built.model.constraint_by_name("cap_d0_s0_l0_r0").unwrap();
        let xa = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        let xb = built.model.var_by_name("x_t1_d0_s0_l0_r0").unwrap();
        assert_eq!(cap.expr.coeff(xa), 1.0);
        assert_eq!(cap.expr.coeff(xb), 1.0);
        assert_eq!(cap.sense, Sense::Le);
        assert_eq!(cap.rhs, 1.0);
    }

    #[test]
    fn test_discouraged_slot_scores_below_neutral() {
        let grid = single_room_grid(&[30, 30]);
        let talks = vec![talk("A", 30)];
        let mut params = ScheduleParams::default();
        let mut prefs = Prefs::default();
        prefs.set(0, key(0), -1);
        params.prefs = prefs;
        let built = ScheduleModel::build(&grid, &talks, &params).unwrap();

        let discouraged = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        let neutral = built.model.var_by_name("x_t0_d0_s0_l1_r0").unwrap();
        assert!(built.model.objective.coeff(discouraged) <= -PREF_WEIGHT);
        assert_eq!(built.model.objective.coeff(neutral), 0.0);
    }

    #[test]
    fn test_fit_enters_objective_with_tier_weight() {
        let grid = single_room_grid(&[30]);
        let talks = vec![talk("A", 30)];
        let mut params = ScheduleParams::default();
        params.fit = vec![vec![0.5]];
        let built = ScheduleModel::build(&grid, &talks, &params).unwrap();

        let x = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        assert_eq!(built.model.objective.coeff(x), FIT_WEIGHT * 0.5);
    }

    #[test]
    fn test_cooc_pair_gets_indicator_and_linearization() {
        let mut grid = ScheduleGrid::new(
            1,
            1,
            1,
            vec![
                RoomSpec {
                    name: "R1".to_string(),
                    capacity: 100,
                },
                RoomSpec {
                    name: "R2".to_string(),
                    capacity: 100,
                },
            ],
        );
        grid.set_slot_length(
            SlotKey {
                day: 0,
                session: 0,
                slot: 0,
                room: 0,
            },
            30,
        );
        grid.set_slot_length(
            SlotKey {
                day: 0,
                session: 0,
                slot: 0,
                room: 1,
            },
            30,
        );

        let talks = vec![talk("A", 30), talk("B", 30)];
        let mut params = ScheduleParams::default();
        params.cooc = vec![vec![0.0, 0.64], vec![0.64, 0.0]];
        let built = ScheduleModel::build(&grid, &talks, &params).unwrap();

        let co = built.model.var_by_name("co_t0_t1").unwrap();
        let row = built.model.constraint_by_name("co_t0_t1_d0_s0_l0").unwrap();
        let xa0 = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        let xa1 = built.model.var_by_name("x_t0_d0_s0_l0_r1").unwrap();
        let xb0 = built.model.var_by_name("x_t1_d0_s0_l0_r0").unwrap();
        assert_eq!(row.expr.coeff(xa0), 1.0);
        assert_eq!(row.expr.coeff(xa1), 1.0);
        assert_eq!(row.expr.coeff(xb0), 1.0);
        assert_eq!(row.expr.coeff(co), -1.0);
        assert_eq!(row.rhs, 1.0);

        // Dispersion tier: sharing a parallel position costs the pair.
        assert_eq!(built.model.objective.coeff(co), -(COOC_WEIGHT * 0.64));
    }

    #[test]
    fn test_sponsored_pair_cannot_run_in_parallel() {
        let mut grid = ScheduleGrid::new(
            1,
            1,
            1,
            vec![
                RoomSpec {
                    name: "R1".to_string(),
                    capacity: 100,
                },
                RoomSpec {
                    name: "R2".to_string(),
                    capacity: 100,
                },
            ],
        );
        for room in 0..2 {
            grid.set_slot_length(
                SlotKey {
                    day: 0,
                    session: 0,
                    slot: 0,
                    room,
                },
                30,
            );
        }

        let mut s1 = talk("S1", 30);
        s1.sponsored = true;
        let mut s2 = talk("S2", 30);
        s2.sponsored = true;
        let built =
            ScheduleModel::build(&grid, &[s1, s2], &ScheduleParams::default()).unwrap();

        let hard = built
            .model
            .constraint_by_name("spon_t0_t1_d0_s0_l0")
            .unwrap();
        assert_eq!(hard.sense, Sense::Le);
        assert_eq!(hard.rhs, 1.0);
        // All four placement variables participate with coefficient one.
        assert_eq!(hard.expr.len(), 4);
    }

    #[test]
    fn test_track_homogeneity_rows() {
        let grid = single_room_grid(&[30, 30]);
        let mut a = talk("A", 30);
        a.main_track = Some("PyData".to_string());
        let mut b = talk("B", 30);
        b.main_track = Some("General".to_string());
        let built = ScheduleModel::build(&grid, &[a, b], &ScheduleParams::default()).unwrap();

        // Two main tracks, one (day, session, room) cell.
        let mt_general = built.model.var_by_name("mt_d0_s0_r0_m0").unwrap();
        let mt_pydata = built.model.var_by_name("mt_d0_s0_r0_m1").unwrap();
        assert_eq!(built.model.objective.coeff(mt_general), -MAIN_TRACK_WEIGHT);
        assert_eq!(built.model.objective.coeff(mt_pydata), -MAIN_TRACK_WEIGHT);

        let row = built.model.constraint_by_name("mtdef_d0_s0_r0_m1").unwrap();
        let xa0 = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        assert_eq!(row.expr.coeff(xa0), 1.0);
        // |L| = 2 slots per session.
        assert_eq!(row.expr.coeff(mt_pydata), -2.0);
        assert_eq!(row.sense, Sense::Le);
        assert_eq!(row.rhs, 0.0);
    }

    #[test]
    fn test_paired_talks_forced_consecutive() {
        let grid = single_room_grid(&[30, 30]);
        let talks = vec![talk("PART1", 30), talk("PART2", 30)];
        let mut params = ScheduleParams::default();
        params.paired = vec![("PART1".to_string(), "PART2".to_string())];
        let built = ScheduleModel::build(&grid, &talks, &params).unwrap();

        // First part in slot 0 forces the second part into slot 1.
        let row = built
            .model
            .constraint_by_name("pair_t0_t1_d0_s0_l0_r0")
            .unwrap();
        let first_l0 = built.model.var_by_name("x_t0_d0_s0_l0_r0").unwrap();
        let second_l1 = built.model.var_by_name("x_t1_d0_s0_l1_r0").unwrap();
        assert_eq!(row.expr.coeff(first_l0), 1.0);
        assert_eq!(row.expr.coeff(second_l1), -1.0);
        assert_eq!(row.rhs, 0.0);

        // The first part cannot occupy the last position at all.
        let last = built
            .model
            .constraint_by_name("pair_t0_t1_d0_s0_l1_r0")
            .unwrap();
        let first_l1 = built.model.var_by_name("x_t0_d0_s0_l1_r0").unwrap();
        assert_eq!(last.expr.coeff(first_l1), 1.0);
        assert_eq!(last.expr.len(), 1);
        assert_eq!(last.rhs, 0.0);
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let grid = single_room_grid(&[30]);
        let talks = vec![talk("A", 30), talk("A", 30)];
        let err = ScheduleModel::build(&grid, &talks, &ScheduleParams::default()).unwrap_err();
        assert!(matches!(err, Error::NoSchedule(_)));
    }

    #[test]
    fn test_decode_rejects_double_placement() {
        let grid = single_room_grid(&[30, 30]);
        let talks = vec![talk("A", 30)];
        let built = ScheduleModel::build(&grid, &talks, &ScheduleParams::default()).unwrap();

        let mut values = HashMap::new();
        values.insert("x_t0_d0_s0_l0_r0".to_string(), 1.0);
        values.insert("x_t0_d0_s0_l1_r0".to_string(), 1.0);
        let err = built.decode(&values, &grid).unwrap_err();
        assert!(matches!(err, Error::Solver(_)));
    }
}
