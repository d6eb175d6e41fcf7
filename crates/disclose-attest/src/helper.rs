//! Process-backed calendar client.
//!
//! Talks to the timestamping network through an external helper program:
//!
//! ```text
//! <program> [args..] stamp   --digest <hex> --out <path> [--calendars <csv>] [--timeout <ms>]
//! <program> [args..] upgrade --receipt <path>
//! <program> [args..] info    --receipt <path>
//! <program> [args..] verify  --receipt <path> --digest <hex> [--timeout <ms>]
//! ```
//!
//! Each invocation prints one JSON line with an `ok` field. Receipts travel
//! through files in a private temporary directory.

use async_trait::async_trait;
use disclose_core::Sha256Digest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{AttestationError, Result};
use crate::receipt::Receipt;
use crate::traits::{bounded, AttestationClient};

/// Default deadline for a single helper invocation.
pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(30);

const RECEIPT_FILE: &str = "receipt.ots";

#[derive(Debug, Deserialize)]
struct Status {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StampOutput {
    #[serde(default)]
    receipt_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpgradeOutput {
    #[serde(default)]
    changed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct InfoOutput {
    info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VerifyOutput {
    verified: bool,
}

/// An [`AttestationClient`] that shells out to a calendar helper.
#[derive(Debug, Clone)]
pub struct HelperClient {
    program: PathBuf,
    args: Vec<String>,
    calendars: Vec<String>,
    timeout: Duration,
}

impl HelperClient {
    /// Create a client for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            calendars: Vec::new(),
            timeout: DEFAULT_HELPER_TIMEOUT,
        }
    }

    /// Arguments placed before the subcommand (e.g. a script path for an interpreter).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_calendars(mut self, calendars: Vec<String>) -> Self {
        self.calendars = calendars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_ms(&self) -> String {
        self.timeout.as_millis().to_string()
    }

    /// Run one helper invocation and parse its JSON line into `T`.
    async fn run<T: DeserializeOwned>(&self, subcommand: &str, args: Vec<String>) -> Result<T> {
        debug!(program = %self.program.display(), subcommand, "running attestation helper");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(subcommand)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = bounded(self.timeout, async {
            command.output().await.map_err(AttestationError::from)
        })
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(subcommand, status = %output.status, "attestation helper failed");
            return Err(AttestationError::Helper(if stderr.is_empty() {
                format!("{subcommand} exited with {}", output.status)
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| AttestationError::Helper(format!("{subcommand} produced no output")))?;

        let status: Status = serde_json::from_str(line)?;
        if !status.ok {
            return Err(AttestationError::Calendar(
                status
                    .error
                    .unwrap_or_else(|| format!("{subcommand} reported failure")),
            ));
        }
        Ok(serde_json::from_str(line)?)
    }

    async fn stage_receipt(dir: &Path, receipt: &Receipt) -> Result<PathBuf> {
        let path = dir.join(RECEIPT_FILE);
        tokio::fs::write(&path, receipt.as_bytes()).await?;
        Ok(path)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl AttestationClient for HelperClient {
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join(RECEIPT_FILE);

        let mut args = vec![
            "--digest".to_string(),
            digest.to_hex(),
            "--out".to_string(),
            path_arg(&out),
        ];
        if !self.calendars.is_empty() {
            args.push("--calendars".to_string());
            args.push(self.calendars.join(","));
        }
        args.push("--timeout".to_string());
        args.push(self.timeout_ms());

        let stamped: StampOutput = self.run("stamp", args).await?;
        let path = stamped.receipt_path.map(PathBuf::from).unwrap_or(out);
        let bytes = tokio::fs::read(&path).await?;
        if bytes.is_empty() {
            return Err(AttestationError::MalformedReceipt("empty receipt".into()));
        }
        Ok(Receipt::from(bytes))
    }

    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt> {
        let dir = tempfile::tempdir()?;
        let path = Self::stage_receipt(dir.path(), receipt).await?;

        let upgraded: UpgradeOutput = self
            .run("upgrade", vec!["--receipt".to_string(), path_arg(&path)])
            .await?;
        if !upgraded.changed.unwrap_or(false) {
            return Ok(receipt.clone());
        }
        let bytes = tokio::fs::read(&path).await?;
        Ok(Receipt::from(bytes))
    }

    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool> {
        let dir = tempfile::tempdir()?;
        let path = Self::stage_receipt(dir.path(), receipt).await?;

        let verified: VerifyOutput = self
            .run(
                "verify",
                vec![
                    "--receipt".to_string(),
                    path_arg(&path),
                    "--digest".to_string(),
                    digest.to_hex(),
                    "--timeout".to_string(),
                    self.timeout_ms(),
                ],
            )
            .await?;
        Ok(verified.verified)
    }

    async fn describe(&self, receipt: &Receipt) -> Result<String> {
        let dir = tempfile::tempdir()?;
        let path = Self::stage_receipt(dir.path(), receipt).await?;

        let info: InfoOutput = self
            .run("info", vec!["--receipt".to_string(), path_arg(&path)])
            .await?;
        Ok(match info.info {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }
}
