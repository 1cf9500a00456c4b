//! Spacer (Z3 fixedpoint) back-end.
//!
//! Rules and relations accumulate in memory; every query renders the full
//! system as an SMT-LIB2 `HORN` script, pipes it to an external `z3`
//! process and parses the answer. Free rule variables are discovered by
//! tokenizing the rule against the declared-variable set and bound
//! universally per rule.
//!
//! Note the polarity flip: the script asserts `query ⇒ false`, so the
//! solver answering `sat` means an interpretation of the relations exists
//! and the queried relation is unreachable (`Unsatisfiable` here), while
//! `unsat` means a derivation of the query exists (`Satisfiable`).

use crate::engine::{CheckResult, HornEngine};
use solhorn_smt::term::for_each_atom;
use solhorn_smt::{Sort, SmtExpr};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SpacerError {
    #[error("{0}")]
    SolverNotFound(String),
    #[error("failed to build solver runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for the external solver.
#[derive(Debug, Clone)]
pub struct SpacerConfig {
    /// Solver binary; falls back to `$SOLHORN_Z3`, then `z3` on `PATH`.
    pub binary: Option<PathBuf>,
    /// Per-query timeout, also passed to the solver as a soft limit.
    pub timeout: Duration,
    /// Select the Spacer fixedpoint engine explicitly.
    pub use_spacer: bool,
    /// Solver verbosity (0 is quiet).
    pub verbosity: u32,
    /// Dump each query script into this directory as `query_<n>.smt2`.
    pub dump_queries: Option<PathBuf>,
    /// Extra `key=value` options forwarded to the solver.
    pub options: Vec<(String, String)>,
}

impl Default for SpacerConfig {
    fn default() -> Self {
        Self {
            binary: std::env::var_os("SOLHORN_Z3").map(PathBuf::from),
            timeout: Duration::from_secs(10),
            use_spacer: true,
            verbosity: 0,
            dump_queries: None,
            options: Vec::new(),
        }
    }
}

impl SpacerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_spacer(mut self, use_spacer: bool) -> Self {
        self.use_spacer = use_spacer;
        self
    }

    pub fn with_dump_queries(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_queries = Some(dir.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }
}

/// Locate an executable on `PATH`.
fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Render the accumulated system plus one reachability query as an
/// SMT-LIB2 `HORN` script.
fn horn_script(
    variables: &BTreeMap<String, Sort>,
    relations: &BTreeMap<String, Sort>,
    rules: &[(String, SmtExpr)],
    query: &SmtExpr,
) -> String {
    let mut script = String::new();
    let _ = writeln!(script, "(set-logic HORN)");
    script.push('\n');

    for (name, sort) in relations {
        let domain: Vec<String> = sort.domain().iter().map(Sort::to_smt_string).collect();
        let _ = writeln!(script, "(declare-fun {} ({}) Bool)", name, domain.join(" "));
    }
    script.push('\n');

    for (name, rule) in rules {
        let _ = writeln!(script, "; {name}");
        let _ = writeln!(script, "{}", quantified_assertion(variables, &rule.text));
    }
    script.push('\n');

    let goal = format!("(=> {} false)", query.text);
    let _ = writeln!(script, "; query");
    let _ = writeln!(script, "{}", quantified_assertion(variables, &goal));
    script.push_str("(check-sat)\n");
    script
}

/// Wrap a formula in `(assert (forall ...))` over exactly the declared
/// variables that occur free in it.
fn quantified_assertion(variables: &BTreeMap<String, Sort>, formula: &str) -> String {
    let mut free = BTreeSet::new();
    for_each_atom(formula, |atom| {
        if variables.contains_key(atom) {
            free.insert(atom.to_string());
        }
    });
    if free.is_empty() {
        return format!("(assert {formula})");
    }
    let bindings: Vec<String> = free
        .iter()
        .map(|name| format!("({} {})", name, variables[name].to_smt_string()))
        .collect();
    format!("(assert (forall ({}) {}))", bindings.join(" "), formula)
}

/// Map solver output to a verdict; see the module docs for the polarity.
fn parse_verdict(stdout: &str) -> CheckResult {
    let trimmed = stdout.trim();
    if trimmed.starts_with("unsat") {
        CheckResult::Satisfiable
    } else if trimmed.starts_with("sat") {
        CheckResult::Unsatisfiable
    } else if trimmed.contains("unknown") {
        CheckResult::Unknown
    } else {
        CheckResult::Error
    }
}

/// A [`HornEngine`] backed by an external Spacer process.
///
/// Queries block the caller; the tokio machinery driving the child process
/// runs on an internal current-thread runtime.
pub struct SpacerEngine {
    binary: PathBuf,
    config: SpacerConfig,
    runtime: tokio::runtime::Runtime,
    variables: BTreeMap<String, Sort>,
    relations: BTreeMap<String, Sort>,
    rules: Vec<(String, SmtExpr)>,
    queries_run: usize,
}

impl SpacerEngine {
    pub fn new(config: SpacerConfig) -> Result<Self, SpacerError> {
        let binary = match &config.binary {
            Some(binary) => binary.clone(),
            None => find_executable("z3").ok_or_else(|| {
                SpacerError::SolverNotFound("z3 not found in PATH".to_string())
            })?,
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SpacerError::Runtime)?;
        debug!(binary = %binary.display(), "using Horn solver");
        Ok(Self {
            binary,
            config,
            runtime,
            variables: BTreeMap::new(),
            relations: BTreeMap::new(),
            rules: Vec::new(),
            queries_run: 0,
        })
    }

    pub fn with_defaults() -> Result<Self, SpacerError> {
        Self::new(SpacerConfig::default())
    }

    fn dump_script(&self, script: &str) {
        let Some(dir) = &self.config.dump_queries else {
            return;
        };
        let path = dir.join(format!("query_{}.smt2", self.queries_run));
        if let Err(err) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, script)) {
            warn!(path = %path.display(), error = %err, "failed to dump query script");
        }
    }

    fn run_solver(&self, script: &str) -> (CheckResult, Vec<String>) {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-smt2").arg("-in");
        if self.config.use_spacer {
            cmd.arg("fp.engine=spacer");
        }
        let timeout_ms = self.config.timeout.as_millis();
        if timeout_ms > 0 {
            cmd.arg(format!("-t:{timeout_ms}"));
        }
        if self.config.verbosity > 0 {
            cmd.arg(format!("-v:{}", self.config.verbosity));
        }
        for (key, value) in &self.config.options {
            cmd.arg(format!("{key}={value}"));
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(binary = %self.binary.display(), "invoking Horn solver");

        // a grace period on top of the solver's own soft limit
        let deadline = self.config.timeout + Duration::from_secs(1);
        let outcome = self.runtime.block_on(async {
            let mut child = cmd.spawn()?;
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(script.as_bytes()).await?;
            }
            match timeout(deadline, child.wait_with_output()).await {
                Ok(result) => result.map(Some),
                Err(_) => Ok(None),
            }
        });

        match outcome {
            Ok(Some(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                debug!(%stdout, "solver finished");
                if !stderr.is_empty() {
                    debug!(%stderr, "solver stderr");
                }
                let verdict = parse_verdict(&stdout);
                if verdict == CheckResult::Error {
                    warn!(%stdout, %stderr, "unexpected solver output");
                }
                let lines = stdout.lines().map(str::to_string).collect();
                (verdict, lines)
            }
            Ok(None) => {
                warn!(timeout = ?self.config.timeout, "Horn solver timed out");
                (CheckResult::Unknown, vec!["timeout".to_string()])
            }
            Err(err) => {
                warn!(error = %err, "failed to run Horn solver");
                (CheckResult::Error, vec![err.to_string()])
            }
        }
    }
}

impl HornEngine for SpacerEngine {
    fn declare_variable(&mut self, name: &str, sort: &Sort) {
        self.variables.insert(name.to_string(), sort.clone());
    }

    fn register_relation(&mut self, name: &str, sort: &Sort) {
        self.relations.insert(name.to_string(), sort.clone());
    }

    fn add_rule(&mut self, rule: &SmtExpr, name: &str) {
        self.rules.push((name.to_string(), rule.clone()));
    }

    fn query(&mut self, query: &SmtExpr) -> (CheckResult, Vec<String>) {
        let script = horn_script(&self.variables, &self.relations, &self.rules, query);
        self.queries_run += 1;
        self.dump_script(&script);
        self.run_solver(&script)
    }
}
