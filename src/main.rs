//! create-vm - AntiCheatVM configuration generator
//!
//! Generates a libvirt domain XML for a Windows KVM guest with VFIO PCI
//! passthrough, provisions its qcow2 backing disk, and optionally registers
//! the domain with libvirt.
//!
//! This will:
//! 1. Load the passthrough device list from config/vfio_devices.yaml
//! 2. Detect the host CPU and suggest a vCPU count
//! 3. Create a qcow2 disk image with qemu-img
//! 4. Write the domain XML under vms/
//! 5. Optionally run `virsh define` on the result

use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod cli;
mod config;
mod disk;
mod domain;
mod exec;
mod hostcpu;
mod prompt;
mod virsh;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let root = std::env::current_dir().context("cannot determine working directory")?;
    let mut input = std::io::stdin().lock();
    app::run(cli, &exec::HostTools, &root, &mut input)
}
