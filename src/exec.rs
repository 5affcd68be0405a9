//! External tool invocation.
//!
//! Every external binary the pipeline relies on (lscpu, qemu-img, virsh) is
//! reached through [`ToolRunner`], so everything up to the actual spawn can
//! run in tests without the host environment present.

use anyhow::{Context, Result};
use std::process::Command;

/// Captured result of one external command.
#[derive(Clone, Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait ToolRunner {
    /// Runs `program` with `args`, blocking until it exits.
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput>;

    /// Whether `program` resolves on PATH.
    fn available(&self, program: &str) -> bool;
}

/// Production runner: spawns real subprocesses.
pub struct HostTools;

impl ToolRunner for HostTools {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {program}"))?;
        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
