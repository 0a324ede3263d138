//! Category test runner.
//!
//! Shells out to cargo (and a couple of optional cargo plugins) one category
//! at a time, and boots the MCP server once to check that it starts. Nothing
//! in the tool or server layers depends on this module.


use chrono::Utc;
use clap::ValueEnum;
use console::style;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::{Result, ToolkitError};

/// How long the server gets to fail before it is assumed to be up.
pub const SERVER_STARTUP_WAIT: Duration = Duration::from_secs(5);
/// How long the server gets to exit after its stdin is closed.
pub const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Unit,
    Lint,
    Type,
    Performance,
    Integration,
    Coverage,
    Server,
}

impl Category {
    /// Key used for this category in summaries and the results file.
    #[inline]
    pub const fn result_key(self) -> &'static str {
        match self {
            Self::Unit => "unit_tests",
            Self::Lint => "lint_checks",
            Self::Type => "type_checks",
            Self::Performance => "performance_tests",
            Self::Integration => "integration_tests",
            Self::Coverage => "coverage_report",
            Self::Server => "server_startup",
        }
    }

    /// Categories run by [`TaskRunner::run_all`], in order.
    #[inline]
    pub fn plan(include_slow: bool) -> Vec<Self> {
        let mut plan = vec![Self::Unit, Self::Lint, Self::Type];
        if include_slow {
            plan.extend([Self::Performance, Self::Integration]);
        }
        plan.extend([Self::Coverage, Self::Server]);
        plan
    }
}

/// Outcome of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryResult {
    pub success: bool,
    /// Wall-clock seconds.
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryResult {
    /// A category whose tooling is not installed. Counts as passing.
    #[inline]
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The command could not be run at all.
    #[inline]
    pub fn errored(error: impl ToString, started: Instant) -> Self {
        Self {
            success: false,
            duration: started.elapsed().as_secs_f64(),
            returncode: Some(-1),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    fn from_output(output: &Output, started: Instant) -> Self {
        Self {
            success: output.status.success(),
            duration: started.elapsed().as_secs_f64(),
            stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            returncode: output.status.code(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn passed_or_skipped(&self) -> bool {
        self.success || self.skipped
    }

    /// Short failure description for the summary.
    fn failure_reason(&self) -> &str {
        self.error
            .as_deref()
            .or(self.stderr.as_deref().filter(|s| !s.trim().is_empty()))
            .unwrap_or("unknown error")
    }
}

/// Results of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: Vec<(Category, CategoryResult)>,
}

impl RunReport {
    #[inline]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|(_, r)| r.passed_or_skipped())
    }

    #[inline]
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| r.passed_or_skipped())
            .count()
    }

    #[inline]
    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.results
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, r)| r)
    }

    /// Results keyed by [`Category::result_key`].
    #[inline]
    pub fn to_json(&self) -> Result<Value> {
        let mut map = Map::new();
        for (category, result) in &self.results {
            map.insert(
                category.result_key().to_string(),
                serde_json::to_value(result)?,
            );
        }
        Ok(Value::Object(map))
    }
}

/// A command line: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandLine {
    fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_os_string(),
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskRunner {
    project_root: PathBuf,
    cargo: OsString,
    server: CommandLine,
    startup_wait: Duration,
    shutdown_grace: Duration,
}

impl TaskRunner {
    /// Runner for the crate at `project_root`. The server smoke check boots
    /// the running executable's `serve` subcommand.
    #[inline]
    pub fn new(project_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        if !project_root.is_dir() {
            return Err(ToolkitError::Runner(format!(
                "project directory not found: {}",
                project_root.display()
            )));
        }

        let exe = std::env::current_exe()?;
        Ok(Self {
            project_root,
            cargo: std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo")),
            server: CommandLine::new(exe, ["serve"]),
            startup_wait: SERVER_STARTUP_WAIT,
            shutdown_grace: SERVER_SHUTDOWN_GRACE,
        })
    }

    #[inline]
    #[must_use]
    pub fn with_cargo(mut self, cargo: impl AsRef<OsStr>) -> Self {
        self.cargo = cargo.as_ref().to_os_string();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_server_command<I, A>(mut self, program: impl AsRef<OsStr>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        self.server = CommandLine::new(program, args);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_server_timing(mut self, startup_wait: Duration, shutdown_grace: Duration) -> Self {
        self.startup_wait = startup_wait;
        self.shutdown_grace = shutdown_grace;
        self
    }

    #[inline]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[inline]
    pub async fn run_all(&self, include_slow: bool) -> RunReport {
        info!("=== Running full test suite ===");
        let mut report = RunReport::default();
        for category in Category::plan(include_slow) {
            let result = self.run_category(category).await;
            report.results.push((category, result));
        }
        report
    }

    #[inline]
    pub async fn run_category(&self, category: Category) -> CategoryResult {
        info!("Running category: {}", category.result_key());
        match category {
            Category::Unit => self.run_cargo(&["test", "--lib"]).await,
            Category::Integration => self.run_cargo(&["test", "--tests"]).await,
            Category::Performance => self.run_cargo(&["bench", "--features", "bench"]).await,
            Category::Type => self.run_cargo(&["check", "--all-targets"]).await,
            Category::Lint => {
                if !self.probe(&["clippy", "--version"]).await {
                    warn!("clippy not found, skipping lint checks");
                    return CategoryResult::skipped("clippy not found");
                }
                self.run_cargo(&["clippy", "--all-targets"]).await
            }
            Category::Coverage => {
                if !self.probe(&["llvm-cov", "--version"]).await {
                    warn!("cargo-llvm-cov not found, skipping coverage report");
                    return CategoryResult::skipped("cargo-llvm-cov not found");
                }
                self.run_cargo(&["llvm-cov", "--summary-only"]).await
            }
            Category::Server => self.check_server_startup().await,
        }
    }

    /// Whether a cargo subcommand is installed.
    async fn probe(&self, args: &[&str]) -> bool {
        Command::new(&self.cargo)
            .args(args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn run_cargo(&self, args: &[&str]) -> CategoryResult {
        debug!(cargo = ?self.cargo, ?args, "Running cargo");
        let started = Instant::now();
        let output = Command::new(&self.cargo)
            .args(args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => CategoryResult::from_output(&output, started),
            Err(e) => CategoryResult::errored(
                format!("failed to run {}: {}", self.cargo.to_string_lossy(), e),
                started,
            ),
        }
    }

    /// Boot the server and treat "still running after the startup wait" as
    /// success. An early exit is reported with the exit status.
    async fn check_server_startup(&self) -> CategoryResult {
        info!("Checking server startup...");
        let started = Instant::now();

        let mut child = match Command::new(&self.server.program)
            .args(&self.server.args)
            .current_dir(&self.project_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return CategoryResult::errored(e, started),
        };

        let mut stdin = child.stdin.take();

        match tokio::time::timeout(self.startup_wait, child.wait()).await {
            Ok(Ok(_)) => {
                drop(stdin.take());
                match child.wait_with_output().await {
                    Ok(output) => CategoryResult {
                        message: Some("server exited unexpectedly".to_string()),
                        ..CategoryResult::from_output(&output, started)
                    },
                    Err(e) => CategoryResult::errored(e, started),
                }
            }
            Ok(Err(e)) => CategoryResult::errored(e, started),
            Err(_) => {
                // Closing stdin is the server's shutdown signal.
                drop(stdin.take());
                self.stop_server(&mut child).await;
                CategoryResult {
                    success: true,
                    duration: self.startup_wait.as_secs_f64(),
                    message: Some("server started (still running after startup wait)".to_string()),
                    ..CategoryResult::default()
                }
            }
        }
    }

    async fn stop_server(&self, child: &mut Child) {
        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "Server stopped after stdin closed"),
            Ok(Err(e)) => warn!("Failed to wait for server: {}", e),
            Err(_) => {
                warn!("Server did not stop within grace period, killing it");
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill server: {}", e);
                }
            }
        }
    }

    /// Print per-category status lines and totals.
    #[inline]
    pub fn print_summary(&self, report: &RunReport) {
        let total = report.results.len();
        let passed = report.passed_count();
        let rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        println!();
        println!("{}", style("=== TEST SUMMARY ===").bold().cyan());
        println!("Categories run: {}", total);
        println!("Categories passed: {}", passed);
        println!("Success rate: {:.1}%", rate);
        println!();
        println!("{}", style("Details by category:").bold());

        for (category, result) in &report.results {
            let status = if result.skipped {
                style("SKIPPED").yellow()
            } else if result.success {
                style("PASSED").green()
            } else {
                style("FAILED").red()
            };
            println!(
                "  {}: {} ({:.2}s)",
                category.result_key(),
                status,
                result.duration
            );

            if !result.passed_or_skipped() {
                let reason: String = result.failure_reason().chars().take(100).collect();
                println!("    Error: {}...", reason);
            }
        }
    }

    /// Write `{timestamp, project_root, toolchain_version, results}` to
    /// `output_file`.
    #[inline]
    pub async fn save_results_json(&self, report: &RunReport, output_file: &Path) -> Result<()> {
        info!("Saving results to: {}", output_file.display());

        let document = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "project_root": self.project_root.display().to_string(),
            "toolchain_version": self.toolchain_version().await,
            "results": report.to_json()?,
        });

        tokio::fs::write(output_file, serde_json::to_string_pretty(&document)?).await?;
        Ok(())
    }

    async fn toolchain_version(&self) -> String {
        let rustc = std::env::var_os("RUSTC").unwrap_or_else(|| OsString::from("rustc"));
        match Command::new(rustc).arg("--version").output().await {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => "unknown".to_string(),
        }
    }
}
