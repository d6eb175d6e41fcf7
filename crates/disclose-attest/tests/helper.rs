//! HelperClient against a scripted stand-in for the calendar helper.
#![cfg(unix)]

use disclose_attest::{AttestationClient, AttestationError, HelperClient, Receipt};
use disclose_core::Sha256Digest;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const FAKE_HELPER: &str = r#"
cmd="$1"; shift
out=""; receipt=""; digest=""
while [ $# -gt 0 ]; do
  case "$1" in
    --out) out="$2"; shift 2 ;;
    --receipt) receipt="$2"; shift 2 ;;
    --digest) digest="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$cmd" in
  stamp)
    printf 'RCPT:%s' "$digest" > "$out"
    echo "{\"ok\":true,\"receipt_path\":\"$out\"}" ;;
  upgrade)
    printf 'UPGRADED' >> "$receipt"
    echo '{"ok":true,"changed":true}' ;;
  info)
    echo '{"ok":true,"info":{"kind":"fake"}}' ;;
  verify)
    if grep -q "RCPT:$digest" "$receipt"; then
      echo '{"ok":true,"verified":true}'
    else
      echo '{"ok":true,"verified":false}'
    fi ;;
esac
"#;

const FAILING_HELPER: &str = r#"
echo "calendar unreachable" >&2
exit 4
"#;

const REFUSING_HELPER: &str = r#"
echo '{"ok":false,"error":"digest rejected"}'
"#;

const SLOW_HELPER: &str = r#"
sleep 5
echo '{"ok":true}'
"#;

fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

fn client(dir: &TempDir, body: &str) -> HelperClient {
    HelperClient::new("sh")
        .with_args([script(dir.path(), "helper.sh", body)])
        .with_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn test_stamp_upgrade_verify() {
    let dir = TempDir::new().unwrap();
    let helper = client(&dir, FAKE_HELPER);
    let digest = Sha256Digest::hash(b"bundle");

    let receipt = helper.create(&digest).await.unwrap();
    assert_eq!(receipt.as_bytes(), format!("RCPT:{}", digest.to_hex()).as_bytes());
    assert!(helper.verify(&receipt, &digest).await.unwrap());
    assert!(!helper.verify(&receipt, &Sha256Digest::hash(b"other")).await.unwrap());

    let upgraded = helper.upgrade(&receipt).await.unwrap();
    assert!(upgraded.as_bytes().ends_with(b"UPGRADED"));
    assert!(helper.verify(&upgraded, &digest).await.unwrap());
}

#[tokio::test]
async fn test_describe_returns_info_text() {
    let dir = TempDir::new().unwrap();
    let helper = client(&dir, FAKE_HELPER);
    let text = helper.describe(&Receipt::from(b"x".to_vec())).await.unwrap();
    assert_eq!(text, r#"{"kind":"fake"}"#);
}

#[tokio::test]
async fn test_nonzero_exit_is_helper_error() {
    let dir = TempDir::new().unwrap();
    let helper = client(&dir, FAILING_HELPER);
    match helper.create(&Sha256Digest::hash(b"bundle")).await {
        Err(AttestationError::Helper(msg)) => assert!(msg.contains("calendar unreachable")),
        other => panic!("expected helper error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ok_false_is_calendar_error() {
    let dir = TempDir::new().unwrap();
    let helper = client(&dir, REFUSING_HELPER);
    match helper.create(&Sha256Digest::hash(b"bundle")).await {
        Err(AttestationError::Calendar(msg)) => assert_eq!(msg, "digest rejected"),
        other => panic!("expected calendar error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_helper_times_out() {
    let dir = TempDir::new().unwrap();
    let helper = client(&dir, SLOW_HELPER).with_timeout(Duration::from_millis(200));
    let result = helper.create(&Sha256Digest::hash(b"bundle")).await;
    assert!(matches!(result, Err(AttestationError::Timeout(_))));
}
