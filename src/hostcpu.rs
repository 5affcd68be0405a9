//! Host CPU snapshot via `lscpu -J`.
//!
//! The JSON output keeps field names stable across locales, unlike the
//! plain-text table. Detection problems are never fatal: the caller gets a
//! conservative default instead.

use crate::exec::ToolRunner;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostCpu {
    pub model: String,
    pub cores: u32,
}

impl Default for HostCpu {
    fn default() -> Self {
        Self {
            model: "Unknown CPU".to_string(),
            cores: 4,
        }
    }
}

#[derive(Deserialize)]
struct LscpuOutput {
    lscpu: Vec<LscpuField>,
}

#[derive(Deserialize)]
struct LscpuField {
    field: String,
    data: Option<String>,
    #[serde(default)]
    children: Vec<LscpuField>,
}

impl HostCpu {
    /// Queries the host, falling back to [`HostCpu::default`] with a warning
    /// on any failure.
    pub fn detect(tools: &dyn ToolRunner) -> Self {
        match Self::query(tools) {
            Ok(cpu) => cpu,
            Err(e) => {
                eprintln!("[!] Could not query host CPU info: {e:#}. Assuming defaults.");
                Self::default()
            }
        }
    }

    fn query(tools: &dyn ToolRunner) -> Result<Self> {
        let out = tools.run("lscpu", &["-J"])?;
        if !out.success {
            bail!("lscpu exited with failure: {}", out.stderr.trim());
        }
        Self::parse(&out.stdout)
    }

    fn parse(json: &str) -> Result<Self> {
        let parsed: LscpuOutput =
            serde_json::from_str(json).context("unexpected lscpu -J output")?;
        let mut model = None;
        let mut cores = None;
        collect(&parsed.lscpu, &mut model, &mut cores);
        Ok(Self {
            model: model.context("lscpu output has no model name")?,
            cores: cores.context("lscpu output has no CPU count")?,
        })
    }

    /// Half the host cores, never below two.
    pub fn suggested_vcpus(&self) -> u32 {
        (self.cores / 2).max(2)
    }
}

// Newer lscpu nests fields under `children`, older versions keep a flat list.
fn collect(fields: &[LscpuField], model: &mut Option<String>, cores: &mut Option<u32>) {
    for f in fields {
        match (f.field.as_str(), f.data.as_deref()) {
            ("Model name:", Some(data)) => *model = Some(data.to_string()),
            ("CPU(s):", Some(data)) => *cores = data.trim().parse().ok(),
            _ => {}
        }
        collect(&f.children, model, cores);
    }
}
