use clap::Parser;

/// Default vCPU count; a half-the-host-cores suggestion is only offered when
/// the flag is left at this value.
pub const DEFAULT_VCPUS: u32 = 4;

#[derive(Parser, Debug)]
#[command(name = "create-vm")]
#[command(about = "AntiCheatVM - Windows VM configuration generator")]
pub struct Cli {
    /// VM name
    #[arg(short, long, default_value = "AntiCheatVM")]
    pub name: String,

    /// Memory to allocate (GB)
    #[arg(short, long, default_value_t = 8)]
    pub memory: u32,

    /// Disk size (GB)
    #[arg(short, long, default_value_t = 120)]
    pub disk: u32,

    /// Number of vCPUs
    #[arg(short = 'c', long, default_value_t = DEFAULT_VCPUS)]
    pub vcpus: u32,
}
