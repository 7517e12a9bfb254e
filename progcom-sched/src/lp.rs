//! LP-format exchange
//!
//! Writes the model to the CPLEX-LP dialect every common MIP solver reads,
//! and parses it back for verification: a written model re-parses into the
//! identical coefficient matrix and objective vector. Variable order is
//! deterministic, so identical models produce identical files.

use std::collections::{BTreeMap, BTreeSet};

use progcom_common::{Error, Result};

use crate::linexpr::{LinExpr, Sense};
use crate::model::MipModel;

const WRAP_COLUMN: usize = 76;

/// A constraint row in name/value form, as read back from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub name: String,
    pub terms: BTreeMap<String, f64>,
    pub sense: Sense,
    pub rhs: f64,
}

/// A parsed LP document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLp {
    pub objective: BTreeMap<String, f64>,
    pub constraints: Vec<ParsedRow>,
    pub binaries: BTreeSet<String>,
}

/// Serialize a model to LP format.
pub fn write_lp(model: &MipModel) -> String {
    let mut out = String::new();
    out.push_str("\\ progcom schedule model\n");
    out.push_str("Maximize\n");
    out.push_str(" obj:");
    append_terms(&mut out, &model.objective, model);
    out.push('\n');

    out.push_str("Subject To\n");
    for constraint in &model.constraints {
        out.push(' ');
        out.push_str(&constraint.name);
        out.push(':');
        append_terms(&mut out, &constraint.expr, model);
        out.push(' ');
        out.push_str(constraint.sense.as_str());
        out.push(' ');
        out.push_str(&format_number(constraint.rhs));
        out.push('\n');
    }

    out.push_str("Binary\n");
    for name in model.var_names() {
        out.push(' ');
        out.push_str(name);
        out.push('\n');
    }
    out.push_str("End\n");
    out
}

/// Project a model into the same shape the parser produces, for
/// round-trip comparisons.
pub fn to_parsed(model: &MipModel) -> ParsedLp {
    let expr_map = |expr: &LinExpr| -> BTreeMap<String, f64> {
        expr.iter()
            .map(|(var, coeff)| (model.name_of(var).to_string(), coeff))
            .collect()
    };
    ParsedLp {
        objective: expr_map(&model.objective),
        constraints: model
            .constraints
            .iter()
            .map(|c| ParsedRow {
                name: c.name.clone(),
                terms: expr_map(&c.expr),
                sense: c.sense,
                rhs: c.rhs,
            })
            .collect(),
        binaries: model.var_names().iter().cloned().collect(),
    }
}

fn append_terms(out: &mut String, expr: &LinExpr, model: &MipModel) {
    let mut first = true;
    for (var, coeff) in expr.iter() {
        let magnitude = coeff.abs();
        let mut token = String::new();
        if coeff < 0.0 {
            token.push_str("- ");
        } else if !first {
            token.push_str("+ ");
        }
        if magnitude != 1.0 {
            token.push_str(&format_number(magnitude));
            token.push(' ');
        }
        token.push_str(model.name_of(var));

        let line_len = out.len() - out.rfind('\n').map(|i| i + 1).unwrap_or(0);
        if line_len + token.len() + 1 > WRAP_COLUMN {
            out.push_str("\n ");
        } else {
            out.push(' ');
        }
        out.push_str(&token);
        first = false;
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Objective,
    Constraints,
    Binaries,
    Bounds,
    Done,
}

/// Parse an LP document written by [`write_lp`] (plus the common
/// notation variants).
pub fn parse_lp(text: &str) -> Result<ParsedLp> {
    let mut parsed = ParsedLp::default();
    let mut section = Section::Objective;

    // Strip comments, then tokenize; labels keep their trailing colon.
    let tokens: Vec<String> = text
        .lines()
        .map(|line| line.split('\\').next().unwrap_or(""))
        .flat_map(|line| line.split_whitespace().map(String::from).collect::<Vec<_>>())
        .collect();

    let mut row: Option<ParsedRow> = None;
    let mut terms: BTreeMap<String, f64> = BTreeMap::new();
    let mut sign = 1.0;
    let mut pending: Option<f64> = None;
    let mut after_sense: Option<Sense> = None;

    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        let lowered = token.to_ascii_lowercase();

        // Section keywords.
        let keyword = match lowered.as_str() {
            "maximize" | "maximise" | "max" => Some(Section::Objective),
            "subject" => {
                // consume the following "to"
                if tokens
                    .get(index + 1)
                    .map(|t| t.eq_ignore_ascii_case("to"))
                    .unwrap_or(false)
                {
                    index += 1;
                }
                Some(Section::Constraints)
            }
            "st" | "s.t." => Some(Section::Constraints),
            "binary" | "binaries" | "bin" => Some(Section::Binaries),
            "bounds" | "general" | "generals" => Some(Section::Bounds),
            "end" => Some(Section::Done),
            _ => None,
        };
        if let Some(next_section) = keyword {
            finish_row(&mut parsed, &mut row, &mut terms, section)?;
            section = next_section;
            sign = 1.0;
            pending = None;
            after_sense = None;
            index += 1;
            continue;
        }

        match section {
            Section::Objective | Section::Constraints => {
                if let Some(label) = token.strip_suffix(':') {
                    // New labelled row (the objective label is dropped).
                    finish_row(&mut parsed, &mut row, &mut terms, section)?;
                    if section == Section::Constraints {
                        row = Some(ParsedRow {
                            name: label.to_string(),
                            terms: BTreeMap::new(),
                            sense: Sense::Le,
                            rhs: 0.0,
                        });
                    }
                    sign = 1.0;
                    pending = None;
                    after_sense = None;
                } else if let Some(sense) = parse_sense(token) {
                    after_sense = Some(sense);
                    sign = 1.0;
                    pending = None;
                } else if token == "+" {
                    sign = 1.0;
                } else if token == "-" {
                    sign = -sign;
                } else if let Ok(number) = token.parse::<f64>() {
                    if let Some(sense) = after_sense.take() {
                        let mut finished = row.take().ok_or_else(|| {
                            Error::Solver("constraint sense outside a labelled row".to_string())
                        })?;
                        finished.sense = sense;
                        finished.rhs = sign * number;
                        finished.terms = std::mem::take(&mut terms);
                        parsed.constraints.push(finished);
                        sign = 1.0;
                    } else {
                        pending = Some(sign * number);
                        sign = 1.0;
                    }
                } else {
                    // Variable token.
                    let coeff = pending.take().unwrap_or(sign);
                    *terms.entry(token.clone()).or_insert(0.0) += coeff;
                    sign = 1.0;
                }
            }
            Section::Binaries => {
                parsed.binaries.insert(token.clone());
            }
            Section::Bounds | Section::Done => {}
        }
        index += 1;
    }

    finish_row(&mut parsed, &mut row, &mut terms, section)?;
    Ok(parsed)
}

fn parse_sense(token: &str) -> Option<Sense> {
    match token {
        "<=" | "=<" | "<" => Some(Sense::Le),
        ">=" | "=>" | ">" => Some(Sense::Ge),
        "=" => Some(Sense::Eq),
        _ => None,
    }
}

fn finish_row(
    parsed: &mut ParsedLp,
    row: &mut Option<ParsedRow>,
    terms: &mut BTreeMap<String, f64>,
    section: Section,
) -> Result<()> {
    match section {
        Section::Objective => {
            if !terms.is_empty() {
                parsed.objective = std::mem::take(terms);
            }
        }
        Section::Constraints => {
            if row.is_some() {
                return Err(Error::Solver(
                    "constraint row without sense and right-hand side".to_string(),
                ));
            }
            terms.clear();
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linexpr::{LinExpr, Sense};
    use crate::model::MipModel;

    fn small_model() -> MipModel {
        let mut model = MipModel::new();
        let a = model.add_binary("x_a");
        let b = model.add_binary("x_b");
        let c = model.add_binary("x_c");

        model.objective = LinExpr::sum([(a, 100000000.0), (b, 500000.5), (c, -1.0)]);
        model.add_constraint(
            "len",
            LinExpr::sum([(a, 45.0), (b, 30.0)]),
            Sense::Eq,
            45.0,
        );
        model.add_constraint("cap", LinExpr::sum([(a, 1.0), (b, 1.0)]), Sense::Le, 1.0);
        model.add_constraint(
            "disp",
            LinExpr::sum([(a, 1.0), (b, 1.0), (c, -1.0)]),
            Sense::Le,
            1.0,
        );
        model
    }

    #[test]
    fn test_written_lp_has_sections() {
        let text = write_lp(&small_model());
        assert!(text.contains("Maximize"));
        assert!(text.contains("Subject To"));
        assert!(text.contains("Binary"));
        assert!(text.trim_end().ends_with("End"));
    }

    #[test]
    fn test_roundtrip_identical_coefficients() {
        let model = small_model();
        let text = write_lp(&model);
        let parsed = parse_lp(&text).unwrap();
        assert_eq!(parsed, to_parsed(&model));
    }

    #[test]
    fn test_deterministic_output() {
        let first = write_lp(&small_model());
        let second = write_lp(&small_model());
        assert_eq!(first, second);
    }

    #[test]
    fn test_negative_and_unit_coefficients() {
        let mut model = MipModel::new();
        let a = model.add_binary("a");
        let b = model.add_binary("b");
        model.objective = LinExpr::sum([(a, 1.0), (b, -1.0)]);
        model.add_constraint("r", LinExpr::sum([(a, -2.5), (b, 1.0)]), Sense::Ge, -3.0);

        let parsed = parse_lp(&write_lp(&model)).unwrap();
        assert_eq!(parsed.objective["a"], 1.0);
        assert_eq!(parsed.objective["b"], -1.0);
        assert_eq!(parsed.constraints[0].terms["a"], -2.5);
        assert_eq!(parsed.constraints[0].rhs, -3.0);
        assert_eq!(parsed.constraints[0].sense, Sense::Ge);
    }

    #[test]
    fn test_long_rows_wrap_and_reparse() {
        let mut model = MipModel::new();
        let vars: Vec<_> = (0..40)
            .map(|i| model.add_binary(format!("x_t{i}_d0_s0_l0_r0")))
            .collect();
        let expr = LinExpr::sum(vars.iter().map(|&v| (v, 1.0)));
        model.objective = expr.clone();
        model.add_constraint("wide", expr, Sense::Le, 1.0);

        let text = write_lp(&model);
        assert!(text.lines().all(|line| line.len() <= 100));
        let parsed = parse_lp(&text).unwrap();
        assert_eq!(parsed, to_parsed(&model));
    }

    #[test]
    fn test_parse_rejects_rhs_less_row() {
        let err = parse_lp("Maximize\n obj: x\nSubject To\n r: x + y\nEnd\n").unwrap_err();
        assert!(matches!(err, progcom_common::Error::Solver(_)));
    }

    #[test]
    fn test_parse_accepts_notation_variants() {
        let text = "max\n obj: 2 x + y\nst\n r1: x =< 1\n r2: y => 0\nend\n";
        let parsed = parse_lp(text).unwrap();
        assert_eq!(parsed.objective["x"], 2.0);
        assert_eq!(parsed.constraints.len(), 2);
        assert_eq!(parsed.constraints[0].sense, Sense::Le);
        assert_eq!(parsed.constraints[1].sense, Sense::Ge);
    }
}
