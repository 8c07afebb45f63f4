//! Unit tests for package normalization and verification.

use super::*;
use crate::test_utils::{fetch_result, gzip_bytes, vsix_bytes};
use rstest::{fixture, rstest};

#[fixture]
fn id() -> ExtensionIdentifier {
    ExtensionIdentifier::parse("vv13.markdown-auto-preview").expect("identifier should parse")
}

#[fixture]
fn vsix() -> Vec<u8> {
    vsix_bytes("vv13", "markdown-auto-preview", "1.0.0")
}

#[rstest]
fn plain_payload_passes_through(vsix: Vec<u8>) {
    let result = fetch_result(vsix.clone(), ContentEncoding::None);
    assert_eq!(normalize(&result).expect("normalize"), vsix);
}

#[rstest]
fn normalize_is_idempotent_on_plain_payload(vsix: Vec<u8>) {
    let first = normalize(&fetch_result(vsix, ContentEncoding::None)).expect("normalize");
    let second = normalize(&fetch_result(first.clone(), ContentEncoding::None)).expect("again");
    assert_eq!(first, second);
}

#[rstest]
fn gzip_payload_is_decompressed_byte_for_byte(vsix: Vec<u8>) {
    let result = fetch_result(gzip_bytes(&vsix), ContentEncoding::Gzip);
    assert_eq!(normalize(&result).expect("normalize"), vsix);
    // Same input, same output.
    assert_eq!(normalize(&result).expect("normalize twice"), vsix);
}

#[rstest]
fn gzip_magic_is_honoured_without_header(vsix: Vec<u8>) {
    let result = fetch_result(gzip_bytes(&vsix), ContentEncoding::None);
    assert_eq!(normalize(&result).expect("normalize"), vsix);
}

#[rstest]
fn concatenated_gzip_members_are_joined() {
    let mut body = gzip_bytes(b"first half, ");
    body.extend(gzip_bytes(b"second half"));
    let result = fetch_result(body, ContentEncoding::Gzip);
    assert_eq!(
        normalize(&result).expect("normalize"),
        b"first half, second half".to_vec()
    );
}

#[rstest]
#[case::bad_magic({
    let mut body = gzip_bytes(b"payload");
    if let Some(first) = body.first_mut() {
        *first = 0x00;
    }
    body
})]
#[case::invalid_deflate_block(vec![0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff])]
#[case::empty(Vec::new())]
fn malformed_gzip_is_corrupt(#[case] body: Vec<u8>) {
    let result = fetch_result(body, ContentEncoding::Gzip);
    let err = normalize(&result).expect_err("malformed gzip must fail");
    assert!(
        matches!(err, InstallerError::CorruptPackage { .. }),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn verify_accepts_matching_package(id: ExtensionIdentifier, vsix: Vec<u8>) {
    let expected = Sha256Digest::of(&vsix);
    let verified = verify(vsix.clone(), &id, &VerificationPolicy::default()).expect("verify");
    assert_eq!(verified.bytes, vsix);
    assert_eq!(verified.sha256, expected);
    assert_eq!(verified.version.as_deref(), Some("1.0.0"));
}

#[rstest]
fn verify_matches_identity_case_insensitively(vsix: Vec<u8>) {
    let id = ExtensionIdentifier::parse("VV13.Markdown-Auto-Preview").expect("parse");
    assert!(verify(vsix, &id, &VerificationPolicy::default()).is_ok());
}

#[rstest]
fn verify_rejects_other_extension(id: ExtensionIdentifier) {
    let other = vsix_bytes("bierner", "markdown-emoji", "0.3.0");
    let err = verify(other, &id, &VerificationPolicy::default()).expect_err("mismatch");
    assert!(err.to_string().contains("bierner.markdown-emoji"));
}

#[rstest]
fn verify_skips_identity_when_disabled(id: ExtensionIdentifier) {
    let other = vsix_bytes("bierner", "markdown-emoji", "0.3.0");
    let policy = VerificationPolicy {
        check_manifest: false,
        expected_sha256: None,
    };
    let verified = verify(other, &id, &policy).expect("identity not checked");
    assert!(verified.version.is_none());
}

#[rstest]
fn verify_rejects_non_zip_payload(id: ExtensionIdentifier) {
    let err = verify(b"<html>gateway error</html>".to_vec(), &id, &VerificationPolicy::default())
        .expect_err("html is not a package");
    assert!(matches!(err, InstallerError::CorruptPackage { .. }));
}

#[rstest]
fn verify_enforces_pinned_digest(id: ExtensionIdentifier, vsix: Vec<u8>) {
    let policy = VerificationPolicy {
        check_manifest: true,
        expected_sha256: Some(Sha256Digest::of(b"something else")),
    };
    let err = verify(vsix.clone(), &id, &policy).expect_err("digest mismatch");
    assert!(err.to_string().contains("checksum mismatch"));

    let policy = VerificationPolicy {
        check_manifest: true,
        expected_sha256: Some(Sha256Digest::of(&vsix)),
    };
    assert!(verify(vsix, &id, &policy).is_ok());
}

#[test]
fn policy_display_describes_checks() {
    let policy = VerificationPolicy::default();
    assert_eq!(
        policy.to_string(),
        "manifest identity checked, sha256 not pinned"
    );
}
