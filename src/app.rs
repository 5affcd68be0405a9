//! Pipeline orchestration.
//!
//! All prompting and filesystem I/O happens here; descriptor construction
//! itself stays pure in [`crate::domain`].

use crate::cli::{Cli, DEFAULT_VCPUS};
use crate::config::{self, Paths};
use crate::domain::{self, VmSpec};
use crate::exec::ToolRunner;
use crate::hostcpu::HostCpu;
use crate::prompt::confirm;
use anyhow::{Context, Result};
use std::fs;
use std::io::BufRead;
use std::path::Path;

pub fn run(cli: Cli, tools: &dyn ToolRunner, root: &Path, input: &mut dyn BufRead) -> Result<()> {
    print_header();

    let paths = Paths::new(root);
    paths.ensure()?;

    println!("[+] Loading VFIO device config...");
    let devices = config::load_vfio_devices(&paths.devices_file())?;
    println!("[i] Found {} VFIO device(s)", devices.len());

    let cpu = HostCpu::detect(tools);
    println!("[i] Host CPU: {}, {} core(s)", cpu.model, cpu.cores);

    let mut vcpus = cli.vcpus;
    if vcpus == DEFAULT_VCPUS && cpu.cores > DEFAULT_VCPUS {
        let suggested = cpu.suggested_vcpus();
        println!("[i] Half the host cores would be {suggested} vCPUs");
        if confirm(&format!("Use {suggested} vCPUs?"), input)? {
            vcpus = suggested;
        }
    }

    if cli.memory < 4 {
        eprintln!("[!] At least 4 GB of memory is recommended for a Windows guest");
    }
    if cli.disk < 64 {
        eprintln!("[!] At least 64 GB of disk is recommended for a Windows guest");
    }

    println!("[i] Name:   {}", cli.name);
    println!("[i] Memory: {} GB", cli.memory);
    println!("[i] Disk:   {} GB", cli.disk);
    println!("[i] vCPUs:  {vcpus}");
    println!();

    if !confirm("Create the VM now?", input)? {
        println!("Cancelled.");
        return Ok(());
    }

    let disk_path = paths.disk_image(&cli.name);
    println!("[+] Creating disk image ({} GB)...", cli.disk);
    crate::disk::create_image(tools, &disk_path, cli.disk)?;
    println!("[OK] Disk image created: {}", disk_path.display());

    println!("[+] Generating domain XML...");
    let spec = VmSpec {
        name: cli.name.clone(),
        memory_gb: cli.memory,
        vcpus,
        disk_path,
        devices,
    };
    let xml = domain::generate(&spec);

    let xml_path = paths.descriptor(&cli.name);
    fs::write(&xml_path, &xml)
        .with_context(|| format!("failed to write {}", xml_path.display()))?;
    println!("[OK] Domain XML saved: {}", xml_path.display());

    if confirm("Register the VM with libvirt?", input)? {
        match crate::virsh::define(tools, &xml_path) {
            Ok(()) => println!("[OK] Domain registered with libvirt"),
            Err(e) => eprintln!(
                "[!] Registration failed: {e:#}. Descriptor kept at {}",
                xml_path.display()
            ),
        }
    } else {
        println!("[i] Descriptor saved but not registered");
    }

    print_next_steps();
    Ok(())
}

fn print_header() {
    println!("==========================================");
    println!(" AntiCheatVM - Windows VM config generator");
    println!("==========================================");
    println!();
}

fn print_next_steps() {
    println!();
    println!("====================================================");
    println!("VM configuration complete!");
    println!();
    println!("Next steps:");
    println!("1. Install Windows into the VM (virt-manager works)");
    println!("2. Start the VM with start_vm.sh");
    println!("3. Optionally set up Looking Glass for headless passthrough");
    println!("====================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::FakeTools;
    use std::io::Cursor;

    const LSCPU_4_CORES: &str =
        r#"{"lscpu": [{"field": "CPU(s):", "data": "4"}, {"field": "Model name:", "data": "Test CPU"}]}"#;
    const LSCPU_16_CORES: &str =
        r#"{"lscpu": [{"field": "CPU(s):", "data": "16"}, {"field": "Model name:", "data": "Test CPU"}]}"#;

    fn cli() -> Cli {
        use clap::Parser;
        Cli::parse_from(["create-vm"])
    }

    fn write_devices(root: &Path, yaml: &str) {
        fs::create_dir_all(root.join("config")).unwrap();
        fs::write(root.join("config/vfio_devices.yaml"), yaml).unwrap();
    }

    #[test]
    fn test_missing_config_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tools = FakeTools::new();
        let err = run(cli(), &tools, dir.path(), &mut Cursor::new("")).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!dir.path().join("vms/AntiCheatVM.xml").exists());
        assert!(!dir.path().join("vms/AntiCheatVM.qcow2").exists());
    }

    #[test]
    fn test_declining_creation_exits_cleanly_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_devices(dir.path(), "devices:\n  - \"10de:2684\"\n");
        let tools = FakeTools::new();
        tools.push_output(true, LSCPU_4_CORES, "");

        // 4 host cores: no vCPU suggestion, first prompt is the creation one
        run(cli(), &tools, dir.path(), &mut Cursor::new("n\n")).unwrap();

        assert!(!dir.path().join("vms/AntiCheatVM.xml").exists());
        assert!(!dir.path().join("vms/AntiCheatVM.qcow2").exists());
        // only lscpu ran
        assert_eq!(tools.calls.borrow().as_slice(), ["lscpu -J"]);
    }

    #[test]
    fn test_disk_failure_aborts_before_descriptor_write() {
        let dir = tempfile::tempdir().unwrap();
        write_devices(dir.path(), "devices: []\n");
        let tools = FakeTools::new();
        tools.push_output(true, LSCPU_4_CORES, "");
        tools.push_output(false, "", "qemu-img: No space left on device\n");

        let err = run(cli(), &tools, dir.path(), &mut Cursor::new("y\n")).unwrap_err();
        assert!(err.to_string().contains("No space left"));
        assert!(!dir.path().join("vms/AntiCheatVM.xml").exists());
    }

    #[test]
    fn test_full_run_writes_descriptor_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        write_devices(dir.path(), "devices:\n  - \"10de:2684\"\n  - \"10de:22ba\"\n");
        let tools = FakeTools::new();
        tools.push_output(true, LSCPU_16_CORES, "");
        tools.push_output(true, "Formatting ...", ""); // qemu-img
        tools.push_output(true, "Domain defined\n", ""); // virsh

        // accept the vCPU suggestion, confirm creation, confirm registration
        run(cli(), &tools, dir.path(), &mut Cursor::new("y\ny\ny\n")).unwrap();

        let xml = fs::read_to_string(dir.path().join("vms/AntiCheatVM.xml")).unwrap();
        // 16 cores -> suggested 8 vCPUs accepted
        assert!(xml.contains("<vcpu placement='static'>8</vcpu>"));
        assert_eq!(xml.matches("<hostdev").count(), 2);

        let calls = tools.calls.borrow();
        assert_eq!(calls[0], "lscpu -J");
        assert!(calls[1].starts_with("qemu-img create -f qcow2 "));
        assert!(calls[2].starts_with("virsh define "));
    }

    #[test]
    fn test_registration_failure_keeps_descriptor_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        write_devices(dir.path(), "devices: []\n");
        let tools = FakeTools::new();
        tools.push_output(true, LSCPU_4_CORES, "");
        tools.push_output(true, "", ""); // qemu-img
        tools.push_output(false, "", "error: failed to connect\n"); // virsh

        run(cli(), &tools, dir.path(), &mut Cursor::new("y\ny\n")).unwrap();
        assert!(dir.path().join("vms/AntiCheatVM.xml").exists());
    }

    #[test]
    fn test_explicit_vcpus_skips_suggestion() {
        use clap::Parser;
        let dir = tempfile::tempdir().unwrap();
        write_devices(dir.path(), "devices: []\n");
        let tools = FakeTools::new();
        tools.push_output(true, LSCPU_16_CORES, "");
        tools.push_output(true, "", "");

        let cli = Cli::parse_from(["create-vm", "--vcpus", "6"]);
        // first prompt is already the creation confirmation
        run(cli, &tools, dir.path(), &mut Cursor::new("y\nn\n")).unwrap();

        let xml = fs::read_to_string(dir.path().join("vms/AntiCheatVM.xml")).unwrap();
        assert!(xml.contains("<vcpu placement='static'>6</vcpu>"));
    }
}
