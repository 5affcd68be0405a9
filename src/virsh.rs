//! Domain registration via `virsh define`.
//!
//! Registration failure is not fatal for the run: the caller downgrades the
//! error to a warning and leaves the descriptor on disk.

use crate::exec::ToolRunner;
use anyhow::{bail, Result};
use std::path::Path;

pub fn define(tools: &dyn ToolRunner, xml_path: &Path) -> Result<()> {
    if !tools.available("virsh") {
        bail!("virsh not found in PATH. Install libvirt-client.");
    }
    let path = xml_path.display().to_string();
    let out = tools.run("virsh", &["define", &path])?;
    if !out.success {
        bail!("virsh define failed: {}", out.stderr.trim());
    }
    Ok(())
}
