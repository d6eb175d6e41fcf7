//! Engine configuration.

use disclose_attest::{AttestationClient, HelperClient, MockAttestationClient};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DiscloseError, Result};

/// Inputs at or above this size are hashed off the async runtime.
pub const DEFAULT_OFFLOAD_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Filename stored alongside the bundle root receipt.
pub const DEFAULT_RECEIPT_FILENAME: &str = "bundle-root.ots";

/// Helper program used when none is configured.
pub const DEFAULT_HELPER_PROGRAM: &str = "ots-helper";

pub const ENV_MOCK: &str = "DISCLOSE_OTS_MOCK";
pub const ENV_TIMEOUT_MS: &str = "DISCLOSE_ATTEST_TIMEOUT_MS";
pub const ENV_CALENDARS: &str = "DISCLOSE_CALENDARS";
pub const ENV_HELPER: &str = "DISCLOSE_OTS_HELPER";

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscloseConfig {
    /// Files of at least this many bytes are hashed on a blocking thread.
    pub offload_threshold: u64,
    /// Upper bound on how many artifacts are hashed at once.
    pub hash_concurrency: usize,
    /// Deadline for each attestation call.
    pub attestation_timeout: Duration,
    /// Filename recorded for a stamped receipt.
    pub receipt_filename: String,
    /// Calendar URLs passed to the attestation client. Empty means its defaults.
    pub calendars: Vec<String>,
    /// Use the deterministic local client instead of the helper.
    pub deterministic: bool,
    /// Calendar helper program. Scripts ending in `.js`/`.mjs` run under `node`.
    pub helper_program: Option<PathBuf>,
}

impl Default for DiscloseConfig {
    fn default() -> Self {
        Self {
            offload_threshold: DEFAULT_OFFLOAD_THRESHOLD,
            hash_concurrency: 8,
            attestation_timeout: Duration::from_secs(30),
            receipt_filename: DEFAULT_RECEIPT_FILENAME.to_string(),
            calendars: Vec::new(),
            deterministic: false,
            helper_program: None,
        }
    }
}

impl DiscloseConfig {
    /// Defaults overlaid with `DISCLOSE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(flag) = lookup(ENV_MOCK) {
            config.deterministic = is_truthy(&flag);
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| DiscloseError::Config(format!("{ENV_TIMEOUT_MS}: not a number: {ms}")))?;
            config.attestation_timeout = Duration::from_millis(ms);
        }
        if let Some(csv) = lookup(ENV_CALENDARS) {
            config.calendars = parse_calendars(&csv);
        }
        if let Some(helper) = lookup(ENV_HELPER) {
            if !helper.trim().is_empty() {
                config.helper_program = Some(PathBuf::from(helper.trim()));
            }
        }

        Ok(config)
    }

    /// Build the attestation client this configuration selects.
    pub fn attestation_client(&self) -> Box<dyn AttestationClient> {
        if self.deterministic {
            return Box::new(MockAttestationClient::default().with_calendars(self.calendars.clone()));
        }

        let program = self
            .helper_program
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HELPER_PROGRAM));
        let is_script = matches!(
            program.extension().and_then(|e| e.to_str()),
            Some("js" | "mjs")
        );
        let client = if is_script {
            HelperClient::new("node").with_args([program.to_string_lossy().to_string()])
        } else {
            HelperClient::new(program)
        };
        Box::new(
            client
                .with_calendars(self.calendars.clone())
                .with_timeout(self.attestation_timeout),
        )
    }
}

/// Split a comma-separated calendar list, dropping blanks.
pub fn parse_calendars(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
