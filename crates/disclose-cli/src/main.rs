//! Disclose CLI - hash disclosure manifests and manage bundle-root receipts.
//!
//! Prints one JSON line on stdout per invocation. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use disclose::core::CoreError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{digest, hash, info, stamp, upgrade, verify};
use output::Report;

const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_VERIFIED: i32 = 3;
const EXIT_IO: i32 = 5;

#[derive(Parser)]
#[command(name = "disclose")]
#[command(about = "Disclosure hashing and receipt CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a digest for timestamping and save the receipt
    Stamp {
        /// Hex SHA-256 digest to stamp
        #[arg(long, required_unless_present = "manifest", conflicts_with = "manifest")]
        digest: Option<String>,
        /// Where to write the receipt (with --manifest: default receipts/bundle-root.ots)
        #[arg(long, required_unless_present = "manifest")]
        out: Option<PathBuf>,
        /// Stamp this hashed manifest's bundle root and record the receipt in it
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Comma-separated calendar URLs (overrides DISCLOSE_CALENDARS)
        #[arg(long)]
        calendars: Option<String>,
    },
    /// Try to complete a pending receipt in place
    Upgrade {
        /// Path to the receipt (with --manifest: default is the recorded receipt)
        #[arg(long, required_unless_present = "manifest")]
        receipt: Option<PathBuf>,
        /// Upgrade the receipt this manifest recorded and update its status
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Describe a receipt
    Info {
        /// Path to the receipt
        #[arg(long)]
        receipt: PathBuf,
    },
    /// Check a receipt against a digest
    Verify {
        /// Path to the receipt (with --manifest: default is the recorded receipt)
        #[arg(long, required_unless_present = "manifest")]
        receipt: Option<PathBuf>,
        /// Hex SHA-256 digest the receipt should attest to
        #[arg(long, required_unless_present = "manifest", conflicts_with = "manifest")]
        digest: Option<String>,
        /// Verify against the bundle root recomputed from this manifest
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Attestation timeout in milliseconds (overrides DISCLOSE_ATTEST_TIMEOUT_MS)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Hash a manifest's proofs and write the hashes artifact
    Hash {
        /// Path to disclosure.json
        #[arg(long)]
        manifest: PathBuf,
        /// Output path (default: hashes.json next to the manifest)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the SHA-256 and size of a file
    Digest {
        /// File to digest
        #[arg(long)]
        file: PathBuf,
    },
}

impl Commands {
    fn action(&self) -> &'static str {
        match self {
            Commands::Stamp { .. } => "stamp",
            Commands::Upgrade { .. } => "upgrade",
            Commands::Info { .. } => "info",
            Commands::Verify { .. } => "verify",
            Commands::Hash { .. } => "hash",
            Commands::Digest { .. } => "digest",
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<Report> {
    match command {
        Commands::Stamp {
            digest,
            out,
            manifest,
            calendars,
        } => match (manifest, digest, out) {
            (Some(manifest), _, out) => {
                stamp::run_manifest(&manifest, out.as_deref(), calendars.as_deref()).await
            }
            (None, Some(digest), Some(out)) => stamp::run(&digest, &out, calendars.as_deref()).await,
            _ => anyhow::bail!("stamp needs --manifest, or --digest with --out"),
        },
        Commands::Upgrade { receipt, manifest } => match (manifest, receipt) {
            (Some(manifest), receipt) => upgrade::run_manifest(&manifest, receipt.as_deref()).await,
            (None, Some(receipt)) => upgrade::run(&receipt).await,
            (None, None) => anyhow::bail!("upgrade needs --receipt or --manifest"),
        },
        Commands::Info { receipt } => info::run(&receipt).await,
        Commands::Verify {
            receipt,
            digest,
            manifest,
            timeout,
        } => match (manifest, receipt, digest) {
            (Some(manifest), receipt, _) => {
                verify::run_manifest(&manifest, receipt.as_deref(), timeout).await
            }
            (None, Some(receipt), Some(digest)) => verify::run(&receipt, &digest, timeout).await,
            _ => anyhow::bail!("verify needs --manifest, or --receipt with --digest"),
        },
        Commands::Hash { manifest, out } => hash::run(&manifest, out).await,
        Commands::Digest { file } => digest::run(&file).await,
    }
}

/// Map an error to the process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return EXIT_IO;
        }
        if let Some(CoreError::ReadFailure(_)) = cause.downcast_ref::<CoreError>() {
            return EXIT_IO;
        }
    }
    EXIT_FAILURE
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let action = cli.command.action();

    match run(cli.command).await {
        Ok(report) => {
            println!("{}", output::report_line(action, &report));
            if matches!(report, Report::Negative(_)) {
                std::process::exit(EXIT_NOT_VERIFIED);
            }
        }
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            println!("{}", output::error_line(action, &err));
            std::process::exit(exit_code(&err));
        }
    }
}
