//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use async_trait::async_trait;
use disclose_attest::{
    AttestationClient, AttestationError, MockAttestationClient, Receipt, Result,
};
use disclose_core::{
    AssistanceGlobal, AssistanceGrade, AssistanceInfo, AssistanceStage, DraftDocument,
    ProjectInfo, ProofInfo, ProofItem, ProofKind, Sha256Digest, TemplateRef, MANIFEST_VERSION,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A small valid draft: one unhashed file proof and one git proof.
pub fn sample_draft() -> DraftDocument {
    DraftDocument {
        version: MANIFEST_VERSION.to_string(),
        id: "d_sample".to_string(),
        created_at: "2024-05-01T12:00:00Z".to_string(),
        template: TemplateRef {
            slug: "essay".to_string(),
            version: "1".to_string(),
        },
        project: ProjectInfo {
            title: "Sample essay".to_string(),
            author: Some("A. Writer".to_string()),
            links: None,
            audience: None,
        },
        ai_tools: None,
        assistance: AssistanceInfo {
            global: AssistanceGlobal {
                human_percent: 70,
                ai_percent: 30,
            },
            stages: Some(vec![
                AssistanceStage::new("draft", "Drafting", AssistanceGrade::Light),
                AssistanceStage::new("edit", "Editing", AssistanceGrade::Moderate),
            ]),
            notes: None,
        },
        proof: ProofInfo {
            items: vec![
                ProofItem::new("p_outline", "Outline", ProofKind::File).with_path("outline.md"),
                ProofItem::git_commit(
                    "p_repo",
                    "Repository",
                    "github.com/example/essay",
                    "0123456789abcdef0123456789abcdef01234567",
                ),
            ],
            bundle_root_sha256: None,
        },
        timestamps: None,
        publication: None,
    }
}

/// A temporary project directory holding proof files.
pub struct TestFixture {
    dir: tempfile::TempDir,
}

impl TestFixture {
    /// Create a new fixture in a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create fixture directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a proof file relative to the fixture directory.
    pub fn write_proof(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create proof directory");
        }
        std::fs::write(&path, contents).expect("write proof file");
        path
    }

    /// A sample draft whose file proofs point at `names`.
    pub fn draft_with_files(&self, names: &[&str]) -> DraftDocument {
        let mut draft = sample_draft();
        draft.proof.items = names
            .iter()
            .enumerate()
            .map(|(i, name)| ProofItem::new(format!("p_{i}"), *name, ProofKind::File).with_path(*name))
            .collect();
        draft
    }

    /// Write `draft` as `disclosure.json` and return its path.
    pub fn write_draft(&self, draft: &DraftDocument) -> PathBuf {
        let path = self.dir.path().join("disclosure.json");
        let json = draft.to_json_pretty().expect("serialize draft");
        std::fs::write(&path, json).expect("write draft");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A scripted outcome for one attestation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    /// Delegate to the deterministic client.
    Pass,
    /// Fail with a calendar error carrying this message.
    Fail(String),
    /// Never answer.
    Hang,
}

/// An [`AttestationClient`] whose `create` and `upgrade` outcomes are queued.
///
/// An empty queue behaves as [`Scripted::Pass`]. `verify` and `describe`
/// always delegate to the wrapped [`MockAttestationClient`].
#[derive(Debug, Default)]
pub struct ScriptedClient {
    inner: MockAttestationClient,
    creates: Mutex<VecDeque<Scripted>>,
    upgrades: Mutex<VecDeque<Scripted>>,
    create_calls: AtomicUsize,
    upgrade_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for successive `create` calls.
    pub fn on_create(self, outcomes: impl IntoIterator<Item = Scripted>) -> Self {
        self.creates.lock().expect("script lock").extend(outcomes);
        self
    }

    /// Queue outcomes for successive `upgrade` calls.
    pub fn on_upgrade(self, outcomes: impl IntoIterator<Item = Scripted>) -> Self {
        self.upgrades.lock().expect("script lock").extend(outcomes);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn upgrade_calls(&self) -> usize {
        self.upgrade_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn next(queue: &Mutex<VecDeque<Scripted>>) -> Scripted {
        queue
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Scripted::Pass)
    }

    async fn play(outcome: Scripted) -> Result<()> {
        match outcome {
            Scripted::Pass => Ok(()),
            Scripted::Fail(message) => Err(AttestationError::Calendar(message)),
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AttestationClient for ScriptedClient {
    async fn create(&self, digest: &Sha256Digest) -> Result<Receipt> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(Self::next(&self.creates)).await?;
        self.inner.create(digest).await
    }

    async fn upgrade(&self, receipt: &Receipt) -> Result<Receipt> {
        self.upgrade_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(Self::next(&self.upgrades)).await?;
        self.inner.upgrade(receipt).await
    }

    async fn verify(&self, receipt: &Receipt, digest: &Sha256Digest) -> Result<bool> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(receipt, digest).await
    }

    async fn describe(&self, receipt: &Receipt) -> Result<String> {
        self.inner.describe(receipt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_draft_validates() {
        sample_draft().validate().unwrap();
    }

    #[test]
    fn test_fixture_writes_files() {
        let fixture = TestFixture::new();
        let path = fixture.write_proof("nested/notes.txt", b"notes");
        assert_eq!(std::fs::read(path).unwrap(), b"notes");
    }

    #[tokio::test]
    async fn test_scripted_failure_then_pass() {
        let client = ScriptedClient::new().on_create([Scripted::Fail("down".into())]);
        let digest = Sha256Digest::hash(b"root");

        let err = client.create(&digest).await.unwrap_err();
        assert!(matches!(err, AttestationError::Calendar(ref m) if m == "down"));

        let receipt = client.create(&digest).await.unwrap();
        assert!(client.verify(&receipt, &digest).await.unwrap());
        assert_eq!(client.create_calls(), 2);
        assert_eq!(client.verify_calls(), 1);
    }
}
