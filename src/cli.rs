//! Local `formae` CLI delegation
//!
//! Plugin listing, forma evaluation and resource extraction are delegated to
//! the `formae` binary. Processes run synchronously behind [`ProcessRunner`]
//! so tests can substitute a fake.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::error::{FormaeError, Result};

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs external programs to completion
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        tracing::debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| FormaeError::Process(format!("failed to run {}: {}", program, e)))?;
        Ok(output.into())
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// The `formae` command-line tool
#[derive(Clone)]
pub struct FormaeCli {
    runner: Arc<dyn ProcessRunner>,
    program: String,
}

impl FormaeCli {
    pub fn new(runner: Arc<dyn ProcessRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// `formae` from `PATH`, run for real
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), "formae")
    }

    fn run(&self, args: &[&str]) -> Result<ProcessOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&self.program, &args)
    }

    /// `formae plugin list`, returned as plain text
    pub fn list_plugins(&self) -> Result<String> {
        let output = self.run(&["plugin", "list"])?;
        if !output.success {
            return Err(FormaeError::Process(format!(
                "failed to list plugins: {}\noutput: {}",
                output.status_label(),
                output.combined()
            )));
        }
        Ok(output.combined())
    }

    /// Forma JSON for `path`: `.json` files are read as-is, anything else
    /// goes through `formae eval`.
    pub fn eval_forma(&self, path: &str) -> Result<Vec<u8>> {
        let path = expand_path(path);
        if path.extension().map_or(false, |ext| ext == "json") {
            return Ok(std::fs::read(&path)?);
        }

        let path_arg = path.to_string_lossy();
        let output = self.run(&[
            "eval",
            &path_arg,
            "--output-schema",
            "json",
            "--output-consumer",
            "machine",
        ])?;
        if !output.success {
            return Err(FormaeError::Process(format!(
                "formae eval failed: {}",
                output.stderr_text()
            )));
        }
        Ok(output.stdout)
    }

    /// Export resources matching `query` as PKL source
    pub fn extract(&self, query: &str) -> Result<String> {
        let dir = tempfile::Builder::new()
            .prefix("formae-extract-")
            .tempdir()?;
        let out_file = dir.path().join("extracted.pkl");
        self.extract_to(query, &out_file)
    }

    fn extract_to(&self, query: &str, out_file: &Path) -> Result<String> {
        let out_arg = out_file.to_string_lossy();
        let output = self.run(&["extract", "--query", query, "--yes", &out_arg])?;
        if !output.success {
            return Err(FormaeError::Process(format!(
                "formae extract failed: {}\noutput: {}",
                output.status_label(),
                output.combined()
            )));
        }

        std::fs::read_to_string(out_file)
            .map_err(|e| FormaeError::from(e).context("failed to read extracted file"))
    }
}
