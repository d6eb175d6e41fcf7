//! Proptest generators for property-based testing.

use proptest::prelude::*;

use disclose_core::{
    bundle_root, AssistanceGlobal, AssistanceGrade, AssistanceInfo, AssistanceStage,
    DraftDocument, ProjectInfo, ProofInfo, ProofItem, ProofKind, Sha256Digest, TemplateRef,
    MANIFEST_VERSION,
};

/// Generate a random digest.
pub fn digest() -> impl Strategy<Value = Sha256Digest> {
    any::<[u8; 32]>().prop_map(Sha256Digest::from_bytes)
}

/// Generate a proof id like `p_3f`.
pub fn proof_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}".prop_map(|s| format!("p_{s}"))
}

/// Generate an assistance grade.
pub fn grade() -> impl Strategy<Value = AssistanceGrade> {
    prop_oneof![
        Just(AssistanceGrade::None),
        Just(AssistanceGrade::Light),
        Just(AssistanceGrade::Moderate),
        Just(AssistanceGrade::Heavy),
        Just(AssistanceGrade::Full),
    ]
}

/// Generate a valid human/AI split.
pub fn assistance_global() -> impl Strategy<Value = AssistanceGlobal> {
    (0i32..=100).prop_map(|human| AssistanceGlobal {
        human_percent: human,
        ai_percent: 100 - human,
    })
}

/// Generate a hashed file proof.
pub fn file_proof() -> impl Strategy<Value = ProofItem> {
    (proof_id(), "[a-z]{1,12}", digest(), 0u64..1 << 32).prop_map(|(id, name, sha, size)| {
        ProofItem::new(id, name.clone(), ProofKind::File)
            .with_path(format!("{name}.txt"))
            .with_digest(sha)
            .with_size(size)
    })
}

/// Generate a git commit proof.
pub fn git_proof() -> impl Strategy<Value = ProofItem> {
    (proof_id(), "[a-z]{1,10}", "[0-9a-f]{40}")
        .prop_map(|(id, repo, commit)| ProofItem::git_commit(id, "commit", &repo, &commit))
}

/// Generate a mix of file and git proofs with distinct ids.
pub fn proof_items(max: usize) -> impl Strategy<Value = Vec<ProofItem>> {
    prop::collection::vec(prop_oneof![3 => file_proof(), 1 => git_proof()], 0..=max).prop_map(
        |mut items| {
            for (index, item) in items.iter_mut().enumerate() {
                item.id = format!("{}_{index}", item.id);
            }
            items
        },
    )
}

/// Generate a valid draft document whose proofs are all hashed.
pub fn draft_document() -> impl Strategy<Value = DraftDocument> {
    (
        "[a-z0-9]{4,12}",
        "[A-Za-z ]{1,40}",
        assistance_global(),
        prop::collection::vec(grade(), 0..4),
        proof_items(6),
    )
        .prop_map(|(id, title, global, grades, items)| {
            let stages: Vec<AssistanceStage> = grades
                .into_iter()
                .enumerate()
                .map(|(i, g)| AssistanceStage::new(format!("stage{i}"), format!("Stage {i}"), g))
                .collect();
            DraftDocument {
                version: MANIFEST_VERSION.to_string(),
                id: format!("d_{id}"),
                created_at: "2024-01-01T00:00:00Z".to_string(),
                template: TemplateRef {
                    slug: "essay".to_string(),
                    version: "1".to_string(),
                },
                project: ProjectInfo {
                    title,
                    author: None,
                    links: None,
                    audience: None,
                },
                ai_tools: None,
                assistance: AssistanceInfo {
                    global,
                    stages: (!stages.is_empty()).then_some(stages),
                    notes: None,
                },
                proof: ProofInfo {
                    items,
                    bundle_root_sha256: None,
                },
                timestamps: None,
                publication: None,
            }
        })
}

/// Generate an arbitrary JSON value without floats.
pub fn json_value() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(serde_json::Value::from),
        ".{0,12}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-zA-Z_]{0,6}", inner, 0..6)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Parameters for a bundle: a document digest and unordered proof digests.
#[derive(Debug, Clone)]
pub struct BundleParams {
    pub document: Sha256Digest,
    pub proofs: Vec<Sha256Digest>,
}

impl BundleParams {
    pub fn root(&self) -> Sha256Digest {
        bundle_root(&self.document, &self.proofs)
    }
}

impl Arbitrary for BundleParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (digest(), prop::collection::vec(digest(), 0..16))
            .prop_map(|(document, proofs)| BundleParams { document, proofs })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclose_core::{build_hashes, canonicalize, Value};

    proptest! {
        #[test]
        fn root_is_deterministic(params: BundleParams) {
            prop_assert_eq!(params.root(), params.root());
        }

        #[test]
        fn root_ignores_proof_order(params: BundleParams) {
            let mut reversed = params.clone();
            reversed.proofs.reverse();
            prop_assert_eq!(params.root(), reversed.root());
        }

        #[test]
        fn git_proofs_are_hashed_at_creation(item in git_proof()) {
            prop_assert_eq!(item.kind, ProofKind::GitCommit);
            prop_assert!(item.is_hashed());
            prop_assert!(item.git.is_some());
        }

        #[test]
        fn generated_drafts_validate(draft in draft_document()) {
            prop_assert!(draft.validate().is_ok());
        }

        #[test]
        fn generated_drafts_hash(draft in draft_document()) {
            let hashes = build_hashes(&draft).unwrap();
            prop_assert!(hashes.is_consistent());
            prop_assert_eq!(hashes.proof.len(), draft.proof.items.len());
        }

        #[test]
        fn canonical_bytes_parse_back(json in json_value()) {
            let bytes = canonicalize(&Value::from(json.clone())).unwrap();
            let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(parsed, json);
        }
    }
}
