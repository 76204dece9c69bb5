// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DomainError, normalize_email, validate_distinct_candidates, validate_email, validate_name,
};

#[test]
fn test_validate_name_rejects_blank() {
    assert!(validate_name("").is_err());
    assert!(validate_name("   ").is_err());
    assert!(validate_name("Eng").is_ok());
}

#[test]
fn test_validate_email_accepts_common_addresses() {
    assert!(validate_email("alice@acme.org").is_ok());
    assert!(validate_email("  bob.smith+votes@mail.acme.co.uk ").is_ok());
}

#[test]
fn test_validate_email_rejects_malformed_addresses() {
    for email in [
        "",
        "alice",
        "@acme.org",
        "alice@",
        "alice@acme",
        "alice@.org",
        "alice@acme.",
        "alice@acme..org",
        "alice@@acme.org",
        "al ice@acme.org",
    ] {
        assert!(
            matches!(validate_email(email), Err(DomainError::InvalidEmail(_))),
            "expected '{email}' to be rejected"
        );
    }
}

#[test]
fn test_normalize_email_lowercases_and_trims() {
    assert_eq!(normalize_email("  Alice@ACME.org "), "alice@acme.org");
}

#[test]
fn test_candidates_must_be_present() {
    assert_eq!(
        validate_distinct_candidates(&[]),
        Err(DomainError::EmptyCandidateList)
    );
}

#[test]
fn test_duplicate_candidate_is_rejected() {
    assert_eq!(
        validate_distinct_candidates(&[1, 2, 1]),
        Err(DomainError::DuplicateCandidate { user_id: 1 })
    );
    assert!(validate_distinct_candidates(&[1, 2, 3]).is_ok());
}
