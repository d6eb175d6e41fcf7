//! The disclosure document model.
//!
//! A [`DraftDocument`] is what the author edits. It carries post-hoc fields
//! (the bundle root, timestamp status, publication metadata) that are
//! derived from or added after hashing. [`DraftDocument::hashable_view`] is
//! the single projection that drops them; only the view is ever hashed.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canonical::{canonicalize, canonicalize_serialize};
use crate::crypto::Sha256Digest;
use crate::error::{CoreError, Result};
use crate::value::Value;

/// Manifest format version written into new drafts.
pub const MANIFEST_VERSION: &str = "0.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub slug: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Declared split of human and AI contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistanceGlobal {
    pub human_percent: i32,
    pub ai_percent: i32,
}

impl AssistanceGlobal {
    /// Build a split from the human share, the AI share being the remainder.
    pub fn from_human(human_percent: i32) -> Result<Self> {
        let global = Self {
            human_percent,
            ai_percent: 100 - human_percent,
        };
        global.validate()?;
        Ok(global)
    }

    /// Both shares must lie in 0..=100 and sum to 100.
    pub fn validate(&self) -> Result<()> {
        let in_range = |p: i32| (0..=100).contains(&p);
        if !in_range(self.human_percent) || !in_range(self.ai_percent) {
            return Err(CoreError::Validation(
                "assistance percentages must be between 0 and 100".into(),
            ));
        }
        if self.human_percent + self.ai_percent != 100 {
            return Err(CoreError::Validation(format!(
                "global split must sum to 100, got {} + {}",
                self.human_percent, self.ai_percent
            )));
        }
        Ok(())
    }
}

/// How much AI assistance went into a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistanceGrade {
    None,
    Light,
    Moderate,
    Heavy,
    Full,
}

impl AssistanceGrade {
    /// Approximate AI share implied by the grade.
    pub fn approx_ai_percent(self) -> i32 {
        match self {
            AssistanceGrade::None => 0,
            AssistanceGrade::Light => 10,
            AssistanceGrade::Moderate => 30,
            AssistanceGrade::Heavy => 60,
            AssistanceGrade::Full => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssistanceGrade::None => "none",
            AssistanceGrade::Light => "light",
            AssistanceGrade::Moderate => "moderate",
            AssistanceGrade::Heavy => "heavy",
            AssistanceGrade::Full => "full",
        }
    }
}

impl FromStr for AssistanceGrade {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(AssistanceGrade::None),
            "light" => Ok(AssistanceGrade::Light),
            "moderate" => Ok(AssistanceGrade::Moderate),
            "heavy" => Ok(AssistanceGrade::Heavy),
            "full" => Ok(AssistanceGrade::Full),
            other => Err(CoreError::Validation(format!("unknown grade: {other}"))),
        }
    }
}

impl fmt::Display for AssistanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistanceStage {
    pub key: String,
    pub label: String,
    pub grade: AssistanceGrade,
    pub approx_ai_percent: i32,
}

impl AssistanceStage {
    pub fn new(key: impl Into<String>, label: impl Into<String>, grade: AssistanceGrade) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            grade,
            approx_ai_percent: grade.approx_ai_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistanceInfo {
    pub global: AssistanceGlobal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<AssistanceStage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    File,
    GitCommit,
    TextNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitProof {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// One entry in the proof ledger.
///
/// `sha256` is absent until the artifact has been hashed. An empty string
/// in a stored document reads as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofItem {
    pub id: String,
    pub label: String,
    pub kind: ProofKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_digest"
    )]
    pub sha256: Option<Sha256Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before_ai: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitProof>,
}

impl ProofItem {
    /// Create an unhashed proof item.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ProofKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            path: None,
            mime: None,
            size_bytes: None,
            sha256: None,
            created_before_ai: None,
            notes: None,
            git: None,
        }
    }

    /// A git commit proof. Its digest is `SHA256("git:<repo>@<commit>")`.
    pub fn git_commit(
        id: impl Into<String>,
        label: impl Into<String>,
        repo: &str,
        commit: &str,
    ) -> Self {
        let payload = git_payload(repo, commit);
        let mut item = Self::new(id, label, ProofKind::GitCommit);
        item.sha256 = Some(Sha256Digest::hash(payload.as_bytes()));
        item.path = Some(payload);
        item.git = Some(GitProof {
            repo: Some(repo.to_string()),
            commit: Some(commit.to_string()),
        });
        item
    }

    pub fn with_digest(mut self, digest: Sha256Digest) -> Self {
        self.sha256 = Some(digest);
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_hashed(&self) -> bool {
        self.sha256.is_some()
    }
}

/// The byte payload digested for a git commit proof.
pub fn git_payload(repo: &str, commit: &str) -> String {
    format!("git:{repo}@{commit}")
}

fn deserialize_optional_digest<'de, D>(deserializer: D) -> std::result::Result<Option<Sha256Digest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => Sha256Digest::from_hex(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProofInfo {
    pub items: Vec<ProofItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_root_sha256: Option<Sha256Digest>,
}

/// Attestation progress recorded in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStatus {
    /// Nothing has been stamped yet.
    None,
    Pending,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenTimestampsInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TimestampStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_sha256: Option<Sha256Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opentimestamps: Option<OpenTimestampsInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// The editable disclosure document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDocument {
    pub version: String,
    pub id: String,
    pub created_at: String,
    pub template: TemplateRef,
    pub project: ProjectInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tools: Option<Vec<AiTool>>,
    pub assistance: AssistanceInfo,
    pub proof: ProofInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<TimestampInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<PublicationInfo>,
}

impl DraftDocument {
    /// Parse a draft from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Pretty JSON for storage.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Project the draft onto the fields that are hashed.
    pub fn hashable_view(&self) -> HashableView<'_> {
        HashableView {
            version: &self.version,
            id: &self.id,
            created_at: &self.created_at,
            template: &self.template,
            project: &self.project,
            ai_tools: self.ai_tools.as_deref(),
            assistance: &self.assistance,
            proof: HashableProof {
                items: &self.proof.items,
            },
        }
    }

    /// Digest of the canonical bytes of the hashable view.
    pub fn document_digest(&self) -> Result<Sha256Digest> {
        let bytes = self.hashable_view().canonical_bytes()?;
        Ok(Sha256Digest::hash(&bytes))
    }

    /// Check the declared assistance and stage grades.
    pub fn validate(&self) -> Result<()> {
        self.assistance.global.validate()?;
        for stage in self.assistance.stages.iter().flatten() {
            if stage.approx_ai_percent != stage.grade.approx_ai_percent() {
                return Err(CoreError::Validation(format!(
                    "stage {} declares {}% for grade {}",
                    stage.key, stage.approx_ai_percent, stage.grade
                )));
            }
        }
        Ok(())
    }
}

/// The hashed projection of a [`DraftDocument`].
///
/// Holds no bundle root, no timestamps and no publication metadata, so the
/// digest cannot depend on values that are computed from it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HashableView<'a> {
    pub version: &'a str,
    pub id: &'a str,
    pub created_at: &'a str,
    pub template: &'a TemplateRef,
    pub project: &'a ProjectInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_tools: Option<&'a [AiTool]>,
    pub assistance: &'a AssistanceInfo,
    pub proof: HashableProof<'a>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HashableProof<'a> {
    pub items: &'a [ProofItem],
}

impl HashableView<'_> {
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(canonicalize_serialize(self)?)
    }
}

/// Strip the post-hoc fields from an untyped document.
///
/// Same projection as [`DraftDocument::hashable_view`], for documents that
/// are not (or not yet) in the typed model.
pub fn strip_post_hoc_fields(mut value: Value) -> Value {
    if let Value::Mapping(map) = &mut value {
        if let Some(proof) = map.get_mut("proof") {
            proof.remove("bundle_root_sha256");
        }
        map.remove("timestamps");
        map.remove("publication");
    }
    value
}

/// Digest of an untyped document after stripping post-hoc fields.
pub fn value_digest(value: Value) -> Result<Sha256Digest> {
    let bytes = canonicalize(&strip_post_hoc_fields(value))?;
    Ok(Sha256Digest::hash(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DraftDocument {
        DraftDocument {
            version: MANIFEST_VERSION.into(),
            id: "d_1".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            template: TemplateRef {
                slug: "essay".into(),
                version: "1".into(),
            },
            project: ProjectInfo {
                title: "An essay".into(),
                author: Some("Sam".into()),
                links: None,
                audience: None,
            },
            ai_tools: None,
            assistance: AssistanceInfo {
                global: AssistanceGlobal {
                    human_percent: 70,
                    ai_percent: 30,
                },
                stages: Some(vec![AssistanceStage::new(
                    "drafting",
                    "Drafting",
                    AssistanceGrade::Moderate,
                )]),
                notes: None,
            },
            proof: ProofInfo {
                items: vec![ProofItem::git_commit("p1", "Commit", "repo", "abc123")],
                bundle_root_sha256: None,
            },
            timestamps: None,
            publication: None,
        }
    }

    #[test]
    fn test_post_hoc_fields_do_not_change_digest() {
        let draft = sample();
        let before = draft.document_digest().unwrap();

        let mut stamped = draft.clone();
        stamped.proof.bundle_root_sha256 = Some(Sha256Digest::hash(b"root"));
        stamped.timestamps = Some(TimestampInfo {
            opentimestamps: Some(OpenTimestampsInfo {
                enabled: Some(true),
                status: Some(TimestampStatus::Pending),
                receipt_sha256: None,
                receipt_filename: Some("bundle-root.ots".into()),
            }),
        });
        stamped.publication = Some(PublicationInfo {
            slug: Some("s".into()),
            url: None,
            published_at: None,
        });

        assert_eq!(stamped.document_digest().unwrap(), before);
    }

    #[test]
    fn test_content_change_changes_digest() {
        let draft = sample();
        let mut edited = draft.clone();
        edited.project.title = "Another essay".into();
        assert_ne!(draft.document_digest().unwrap(), edited.document_digest().unwrap());
    }

    #[test]
    fn test_typed_and_untyped_digests_agree() {
        let mut draft = sample();
        draft.proof.bundle_root_sha256 = Some(Sha256Digest::hash(b"root"));
        let json = draft.to_json_pretty().unwrap();
        let untyped = Value::from_json_str(&json).unwrap();
        assert_eq!(value_digest(untyped).unwrap(), draft.document_digest().unwrap());
    }

    #[test]
    fn test_git_proof_digest() {
        let item = ProofItem::git_commit("p1", "Commit", "https://example.com/r.git", "deadbeef");
        assert_eq!(item.path.as_deref(), Some("git:https://example.com/r.git@deadbeef"));
        assert_eq!(
            item.sha256,
            Some(Sha256Digest::hash(b"git:https://example.com/r.git@deadbeef"))
        );
        assert_eq!(item.kind, ProofKind::GitCommit);
    }

    #[test]
    fn test_empty_digest_string_reads_as_absent() {
        let item: ProofItem =
            serde_json::from_str(r#"{"id":"p","label":"l","kind":"file","sha256":""}"#).unwrap();
        assert!(!item.is_hashed());
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("sha256"));
    }

    #[test]
    fn test_grades() {
        assert_eq!(AssistanceGrade::None.approx_ai_percent(), 0);
        assert_eq!(AssistanceGrade::Light.approx_ai_percent(), 10);
        assert_eq!(AssistanceGrade::Moderate.approx_ai_percent(), 30);
        assert_eq!(AssistanceGrade::Heavy.approx_ai_percent(), 60);
        assert_eq!(AssistanceGrade::Full.approx_ai_percent(), 90);
        assert_eq!("heavy".parse::<AssistanceGrade>().unwrap(), AssistanceGrade::Heavy);
        assert!("some".parse::<AssistanceGrade>().is_err());
    }

    #[test]
    fn test_global_split_validation() {
        assert!(AssistanceGlobal::from_human(70).is_ok());
        assert!(AssistanceGlobal::from_human(120).is_err());
        let bad = AssistanceGlobal {
            human_percent: 50,
            ai_percent: 40,
        };
        assert!(matches!(bad.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_mismatched_stage_percent() {
        let mut draft = sample();
        assert!(draft.validate().is_ok());
        if let Some(stages) = draft.assistance.stages.as_mut() {
            stages[0].approx_ai_percent = 99;
        }
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let draft = sample();
        let back = DraftDocument::from_json_str(&draft.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn test_timestamp_status_none_roundtrip() {
        let json = r#"{"opentimestamps":{"enabled":false,"status":"none"}}"#;
        let info: TimestampInfo = serde_json::from_str(json).unwrap();
        let ots = info.opentimestamps.as_ref().unwrap();
        assert_eq!(ots.status, Some(TimestampStatus::None));
        assert_eq!(serde_json::to_string(&info).unwrap(), json);

        let mut draft = sample();
        draft.timestamps = Some(info);
        let back = DraftDocument::from_json_str(&draft.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, draft);
    }
}
