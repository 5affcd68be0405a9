//! qcow2 disk provisioning via qemu-img.

use crate::exec::ToolRunner;
use anyhow::{bail, Result};
use std::path::Path;

/// Creates a sparse qcow2 image of `size_gb` gigabytes at `path`.
///
/// Failure is fatal for the run; a partially written image is left in place.
pub fn create_image(tools: &dyn ToolRunner, path: &Path, size_gb: u32) -> Result<()> {
    if !tools.available("qemu-img") {
        bail!("qemu-img not found in PATH. Install qemu-img (qemu-utils).");
    }
    let target = path.display().to_string();
    let size = format!("{size_gb}G");
    let out = tools.run("qemu-img", &["create", "-f", "qcow2", &target, &size])?;
    if !out.success {
        bail!(
            "qemu-img failed to create {}: {}",
            path.display(),
            out.stderr.trim()
        );
    }
    Ok(())
}
