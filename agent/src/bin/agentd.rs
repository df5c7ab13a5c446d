use std::error::Error as _;
use std::path::PathBuf;

use clap::Parser;
use rollout_agent::reference::{FileBootloader, FileFlashStreamer, FileKeyValueStore, StaticIdentity};
use rollout_agent::{autohandler_start, init, AgentConfig, AutohandlerExit};

/// Device-side firmware rollout agent.
#[derive(Debug, Parser)]
struct Args {
    /// Path to the agent's TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Directory holding the file-backed reference store, bootloader marker,
    /// and alternate-slot image used in place of real flash hardware.
    #[arg(long, default_value = "/var/lib/rollout-agent")]
    state_dir: PathBuf,

    /// Device id reported to the server (stands in for a hardware identity
    /// source).
    #[arg(long)]
    device_id: String,

    /// Run a single poll cycle and exit instead of looping forever.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        let cause = error
            .source()
            .map(|cause| format!("\ncause: {cause}"))
            .unwrap_or_default();
        eprintln!("error: {error}{cause}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.state_dir)?;

    let config = AgentConfig::load_from_toml(&args.config)?;

    let kv = FileKeyValueStore::new(args.state_dir.join("action-id.bin"));
    let bootloader = FileBootloader::new(
        args.state_dir.join("confirmed"),
        16 * 1024 * 1024,
        env!("CARGO_PKG_VERSION"),
    );
    let identity = StaticIdentity::new(args.device_id, env!("CARGO_PKG_VERSION"));
    let mut flash = FileFlashStreamer::new(args.state_dir.join("alt-slot.img"));

    init(&kv, &bootloader, &identity)?;

    let max_cycles = args.once.then_some(1);
    match autohandler_start(&config, &kv, &bootloader, &identity, &mut flash, max_cycles).await {
        AutohandlerExit::RebootRequested => {
            tracing::warn!("running image unconfirmed; a warm reboot is required");
            std::process::exit(75); // EX_TEMPFAIL: ask a supervisor to restart us
        }
        AutohandlerExit::CyclesExhausted => Ok(()),
    }
}
