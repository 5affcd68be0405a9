//! Libvirt domain descriptor generation.
//!
//! Pure string construction. The only impurity is the v4 UUID minted per
//! domain; tests pin it through [`render`].

use crate::config::VfioDevice;
use std::path::PathBuf;
use uuid::Uuid;

const OVMF_CODE: &str = "/usr/share/edk2/ovmf/OVMF_CODE.fd";
const NVRAM_DIR: &str = "/var/lib/libvirt/qemu/nvram";
const EMULATOR: &str = "/usr/bin/qemu-system-x86_64";
// Shared-memory segment consumed by the Looking Glass client on the host.
const SHMEM_NAME: &str = "looking-glass";
const SHMEM_SIZE_MB: u32 = 64;

/// Everything the descriptor needs, fixed before generation.
#[derive(Clone, Debug)]
pub struct VmSpec {
    pub name: String,
    pub memory_gb: u32,
    pub vcpus: u32,
    pub disk_path: PathBuf,
    pub devices: Vec<VfioDevice>,
}

/// Builds the domain XML with a fresh random UUID.
pub fn generate(spec: &VmSpec) -> String {
    render(spec, Uuid::new_v4())
}

fn render(spec: &VmSpec, uuid: Uuid) -> String {
    let name = escape(&spec.name);
    let memory_kib = u64::from(spec.memory_gb) * 1024 * 1024;

    let mut xml = String::new();
    xml.push_str(&format!(
        "<domain type='kvm'>
  <name>{name}</name>
  <uuid>{uuid}</uuid>
  <metadata/>
  <memory unit='KiB'>{memory_kib}</memory>
  <currentMemory unit='KiB'>{memory_kib}</currentMemory>
"
    ));

    // host-passthrough with the hypervisor bit hidden, so guest software
    // sees the host CPU rather than a virtualized one
    xml.push_str(
        "  <cpu mode='host-passthrough' check='none'>
    <feature policy='disable' name='hypervisor'/>
    <cache mode='passthrough'/>
  </cpu>
",
    );
    xml.push_str(&format!("  <vcpu placement='static'>{}</vcpu>\n", spec.vcpus));

    // UEFI boot chain, per-VM NVRAM
    xml.push_str(&format!(
        "  <os>
    <type arch='x86_64' machine='q35'>hvm</type>
    <loader readonly='yes' type='pflash'>{OVMF_CODE}</loader>
    <nvram>{NVRAM_DIR}/{name}_VARS.fd</nvram>
    <boot dev='hd'/>
  </os>
"
    ));

    xml.push_str(
        "  <features>
    <acpi/>
    <apic/>
    <hyperv mode='custom'/>
  </features>
  <smbios mode='host'/>
",
    );

    xml.push_str("  <devices>\n");
    xml.push_str(&format!("    <emulator>{EMULATOR}</emulator>\n"));

    xml.push_str(&format!(
        "    <disk type='file' device='disk'>
      <driver name='qemu' type='qcow2' discard='unmap'/>
      <source file='{}'/>
      <target dev='vda' bus='virtio'/>
    </disk>
",
        escape(&spec.disk_path.display().to_string())
    ));

    // installation media gets attached later, so no source here
    xml.push_str(
        "    <disk type='file' device='cdrom'>
      <driver name='qemu' type='raw'/>
      <target dev='sda' bus='sata'/>
      <readonly/>
    </disk>
",
    );

    xml.push_str(
        "    <interface type='network'>
      <source network='default'/>
      <model type='virtio'/>
    </interface>
    <input type='tablet' bus='usb'/>
    <input type='keyboard' bus='usb'/>
",
    );

    // spice stays until the passed-through GPU takes over the display
    xml.push_str(
        "    <graphics type='spice'>
      <listen type='none'/>
    </graphics>
",
    );

    for dev in &spec.devices {
        xml.push_str(&format!(
            "    <hostdev mode='subsystem' type='pci' managed='yes'>
      <source>
        <vendor id='{}'/>
        <product id='{}'/>
      </source>
    </hostdev>
",
            dev.vendor_id(),
            dev.product_id()
        ));
    }

    xml.push_str(&format!(
        "    <shmem name='{SHMEM_NAME}'>
      <model type='ivshmem-plain'/>
      <size unit='M'>{SHMEM_SIZE_MB}</size>
    </shmem>
"
    ));

    xml.push_str("  </devices>\n</domain>\n");
    xml
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
