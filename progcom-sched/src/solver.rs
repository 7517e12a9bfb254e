//! Out-of-process solver invocation
//!
//! The model is handed to a solver binary as an LP file; the solver writes
//! a solution file parseable as (variable name, value) pairs. Exit code 0
//! means success. The invocation honors a wall-clock limit and a
//! cancellation token; both terminate the child process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use progcom_common::{Error, Result};

/// How the solver is invoked. `{model}` and `{solution}` in the argument
/// template are replaced with the exchange file paths.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub binary: PathBuf,
    pub args: Vec<String>,
    /// Wall-clock limit for the child process.
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        // CBC's command-line convention; any solver with an LP reader and
        // a compatible solution printer fits the contract.
        SolverConfig {
            binary: PathBuf::from("cbc"),
            args: vec![
                "{model}".to_string(),
                "solve".to_string(),
                "printingOptions".to_string(),
                "all".to_string(),
                "solution".to_string(),
                "{solution}".to_string(),
            ],
            time_limit: Duration::from_secs(4 * 3600),
        }
    }
}

/// Solver verdict extracted from the solution file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

/// Parsed solver output.
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub values: HashMap<String, f64>,
}

/// Run the solver on a written model file and parse its solution.
///
/// Exceeding the time limit or a cancellation kills the child; a non-zero
/// exit code or an infeasible verdict fails the run.
pub async fn run_solver(
    config: &SolverConfig,
    model_path: &Path,
    solution_path: &Path,
    cancel: &CancellationToken,
) -> Result<SolverSolution> {
    let args: Vec<String> = config
        .args
        .iter()
        .map(|arg| {
            arg.replace("{model}", &model_path.to_string_lossy())
                .replace("{solution}", &solution_path.to_string_lossy())
        })
        .collect();

    tracing::info!(
        binary = %config.binary.display(),
        ?args,
        limit_secs = config.time_limit.as_secs(),
        "invoking solver"
    );

    let mut child = tokio::process::Command::new(&config.binary)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Solver(format!("cannot start {}: {e}", config.binary.display())))?;

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("scheduling run cancelled, terminating solver");
            let _ = child.kill().await;
            return Err(Error::Cancelled);
        }
        _ = tokio::time::sleep(config.time_limit) => {
            tracing::warn!("solver exceeded wall-clock limit, terminating");
            let _ = child.kill().await;
            return Err(Error::NoSchedule(
                "solver time limit exceeded without an incumbent".to_string(),
            ));
        }
        status = child.wait() => {
            status.map_err(|e| Error::Solver(format!("waiting for solver failed: {e}")))?
        }
    };

    if !status.success() {
        return Err(Error::Solver(format!(
            "solver exited with {}",
            status.code().map_or("signal".to_string(), |c| c.to_string())
        )));
    }

    let text = tokio::fs::read_to_string(solution_path)
        .await
        .map_err(|e| Error::Solver(format!("cannot read solution file: {e}")))?;
    let solution = parse_solution(&text);

    if solution.status == SolveStatus::Infeasible {
        return Err(Error::NoSchedule("infeasible".to_string()));
    }
    Ok(solution)
}

/// Parse a solution file: a status header followed by (name, value)
/// lines. Both the bare two-column form and CBC's four-column form
/// (index, name, value, reduced cost) are accepted.
pub fn parse_solution(text: &str) -> SolverSolution {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("").to_ascii_lowercase();

    let status = if header.contains("infeasible") {
        SolveStatus::Infeasible
    } else if header.contains("optimal") {
        SolveStatus::Optimal
    } else if header.contains("stopped") || header.contains("feasible") {
        SolveStatus::Feasible
    } else {
        SolveStatus::Unknown
    };

    let objective = header
        .split_whitespace()
        .last()
        .and_then(|token| token.parse::<f64>().ok());

    let mut values = HashMap::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let pair = match tokens.as_slice() {
            [index, name, value, _reduced] if index.parse::<u64>().is_ok() => {
                Some((*name, *value))
            }
            [name, value] => Some((*name, *value)),
            _ => None,
        };
        if let Some((name, value)) = pair {
            if let Ok(value) = value.parse::<f64>() {
                values.insert(name.to_string(), value);
            }
        }
    }

    SolverSolution {
        status,
        objective,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cbc_optimal_solution() {
        let text = "Optimal - objective value 100000042.5\n\
                    0 x_t0_d0_s0_l0_r0 1 100000000\n\
                    1 x_t0_d0_s0_l1_r0 0 0\n\
                    2 co_t0_t1 1 -10000\n";
        let solution = parse_solution(text);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(100000042.5));
        assert_eq!(solution.values["x_t0_d0_s0_l0_r0"], 1.0);
        assert_eq!(solution.values["x_t0_d0_s0_l1_r0"], 0.0);
        assert_eq!(solution.values["co_t0_t1"], 1.0);
    }

    #[test]
    fn test_parse_two_column_solution() {
        let text = "Optimal - objective value 1\nx_a 1\nx_b 0.0\n";
        let solution = parse_solution(text);
        assert_eq!(solution.values.len(), 2);
        assert_eq!(solution.values["x_a"], 1.0);
    }

    #[test]
    fn test_parse_infeasible_header() {
        let solution = parse_solution("Infeasible - objective value 0\n");
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_parse_time_limit_header() {
        let solution = parse_solution("Stopped on time limit - objective value 17\nx 1\n");
        assert_eq!(solution.status, SolveStatus::Feasible);
        assert_eq!(solution.objective, Some(17.0));
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "Optimal - objective value 1\nnot a value line at all\nx 1\n";
        let solution = parse_solution(text);
        assert_eq!(solution.values.len(), 1);
    }

    fn shell_solver(script: &str, time_limit: Duration) -> SolverConfig {
        SolverConfig {
            binary: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            time_limit,
        }
    }

    #[tokio::test]
    async fn test_run_solver_reads_solution_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.lp");
        let solution = dir.path().join("solution.txt");
        std::fs::write(&model, "End\n").unwrap();

        let config = shell_solver(
            "printf 'Optimal - objective value 2\\nx_a 1\\nx_b 1\\n' > {solution}",
            Duration::from_secs(10),
        );
        let cancel = CancellationToken::new();
        let result = run_solver(&config, &model, &solution, &cancel).await.unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.values["x_a"], 1.0);
    }

    #[tokio::test]
    async fn test_run_solver_infeasible_is_no_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.lp");
        let solution = dir.path().join("solution.txt");
        std::fs::write(&model, "End\n").unwrap();

        let config = shell_solver(
            "printf 'Infeasible - objective value 0\\n' > {solution}",
            Duration::from_secs(10),
        );
        let cancel = CancellationToken::new();
        let err = run_solver(&config, &model, &solution, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoSchedule(reason) if reason == "infeasible"));
    }

    #[tokio::test]
    async fn test_run_solver_nonzero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = shell_solver("exit 3", Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let err = run_solver(
            &config,
            &dir.path().join("m.lp"),
            &dir.path().join("s.txt"),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Solver(_)));
    }

    #[tokio::test]
    async fn test_run_solver_time_limit_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let config = shell_solver("sleep 30", Duration::from_millis(200));
        let cancel = CancellationToken::new();
        let start = std::time::Instant::now();
        let err = run_solver(
            &config,
            &dir.path().join("m.lp"),
            &dir.path().join("s.txt"),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NoSchedule(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_solver_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let config = shell_solver("sleep 30", Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });
        let err = run_solver(
            &config,
            &dir.path().join("m.lp"),
            &dir.path().join("s.txt"),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_default_config_uses_cbc_convention() {
        let config = SolverConfig::default();
        assert_eq!(config.binary, PathBuf::from("cbc"));
        assert!(config.args.iter().any(|a| a == "{model}"));
        assert!(config.args.iter().any(|a| a == "{solution}"));
    }
}
