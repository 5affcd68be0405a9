//! Run-root layout and the VFIO passthrough device list.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout under the run root.
pub struct Paths {
    pub config_dir: PathBuf,
    pub vms_dir: PathBuf,
}

impl Paths {
    pub fn new(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            vms_dir: root.join("vms"),
        }
    }

    /// Creates config/ and vms/ if missing.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.vms_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn devices_file(&self) -> PathBuf {
        self.config_dir.join("vfio_devices.yaml")
    }

    pub fn disk_image(&self, vm_name: &str) -> PathBuf {
        self.vms_dir.join(format!("{vm_name}.qcow2"))
    }

    pub fn descriptor(&self, vm_name: &str) -> PathBuf {
        self.vms_dir.join(format!("{vm_name}.xml"))
    }
}

/// One PCI function to pass through, written as `VVVV:DDDD` in the config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VfioDevice {
    pub vendor: u16,
    pub device: u16,
}

impl VfioDevice {
    /// Parses `"10de:2684"`. Both halves must be exactly four hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        let (vendor, device) = s.split_once(':')?;
        if vendor.len() != 4 || device.len() != 4 {
            return None;
        }
        Some(Self {
            vendor: u16::from_str_radix(vendor, 16).ok()?,
            device: u16::from_str_radix(device, 16).ok()?,
        })
    }

    /// Vendor id the way libvirt wants it (`0x10de`).
    pub fn vendor_id(&self) -> String {
        format!("{:#06x}", self.vendor)
    }

    /// Device id the way libvirt wants it (`0x2684`).
    pub fn product_id(&self) -> String {
        format!("{:#06x}", self.device)
    }
}

impl fmt::Display for VfioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.device)
    }
}

#[derive(Deserialize)]
struct DeviceFile {
    #[serde(default)]
    devices: Vec<String>,
}

/// Loads the passthrough device list written by the VFIO setup step.
///
/// A missing or unparsable file is fatal. Entries that do not look like
/// `VVVV:DDDD` are skipped with a warning so one typo cannot block the run.
pub fn load_vfio_devices(path: &Path) -> Result<Vec<VfioDevice>> {
    if !path.exists() {
        bail!(
            "VFIO device config not found at {}. Run setup_vfio.sh first.",
            path.display()
        );
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: DeviceFile = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut devices = Vec::new();
    for entry in &file.devices {
        match VfioDevice::parse(entry) {
            Some(dev) => devices.push(dev),
            None => eprintln!("[!] Ignoring malformed device id {entry:?} (expected VVVV:DDDD)"),
        }
    }
    Ok(devices)
}
