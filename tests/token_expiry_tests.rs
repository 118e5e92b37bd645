// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token lifetime tests.
//!
//! Uses the explicit-clock variants so the expiry boundary is deterministic.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use natty_fit::services::token::{Claims, Identity, TokenError, TokenService};

const SECRET: &[u8] = b"test_jwt_key_32_bytes_minimum!!";
const DAY: u64 = 24 * 60 * 60;
const T0: u64 = 1_767_225_600;

fn alice() -> Identity {
    Identity {
        id: "user-alice".to_string(),
        email: "alice@example.com".to_string(),
        role: None,
    }
}

#[test]
fn test_token_valid_for_seven_days() {
    let tokens = TokenService::new(SECRET);
    let issued = tokens.issue_at(&alice(), T0).unwrap();

    let claims = tokens.verify_at(&issued.token, T0 + 6 * DAY).unwrap();
    assert_eq!(claims.sub, "user-alice");
    assert_eq!(claims.email, "alice@example.com");

    assert!(matches!(
        tokens.verify_at(&issued.token, T0 + 8 * DAY),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_expiry_boundary_is_exclusive() {
    let tokens = TokenService::new(SECRET);
    let issued = tokens.issue_at(&alice(), T0).unwrap();
    let exp = issued.claims.exp;

    assert!(tokens.verify_at(&issued.token, exp - 1).is_ok());
    assert!(matches!(
        tokens.verify_at(&issued.token, exp),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_wrong_secret_is_invalid() {
    let issued = TokenService::new(SECRET).issue_at(&alice(), T0).unwrap();
    let other = TokenService::new(b"a_completely_different_secret!!!");

    assert!(matches!(
        other.verify_at(&issued.token, T0 + 1),
        Err(TokenError::Invalid)
    ));
}

#[test]
fn test_tampered_token_is_invalid() {
    let tokens = TokenService::new(SECRET);
    let issued = tokens.issue_at(&alice(), T0).unwrap();

    // Flip the first signature character; it encodes six full bits
    let (head, signature) = issued.token.rsplit_once('.').unwrap();
    let first = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", head, first, &signature[1..]);

    assert!(matches!(
        tokens.verify_at(&tampered, T0 + 1),
        Err(TokenError::Invalid)
    ));
    assert!(matches!(
        tokens.verify_at("not-a-jwt", T0 + 1),
        Err(TokenError::Invalid)
    ));
}

/// Tokens are plain HS256 JWTs any standard decoder can read.
#[test]
fn test_claims_decode_with_standard_validation() {
    let tokens = TokenService::new(SECRET);
    let issued = tokens.issue_at(&alice(), T0).unwrap();

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let decoded = decode::<Claims>(
        &issued.token,
        &DecodingKey::from_secret(SECRET),
        &validation,
    )
    .unwrap();

    assert_eq!(decoded.claims.sub, "user-alice");
    assert_eq!(decoded.claims.iat, T0);
    assert_eq!(decoded.claims.exp, T0 + 7 * DAY);
    assert!(!decoded.claims.jti.is_empty());
}

#[test]
fn test_revocation_only_affects_that_token() {
    let tokens = TokenService::new(SECRET);
    let kept = tokens.issue_at(&alice(), T0).unwrap();
    let revoked = tokens.issue_at(&alice(), T0).unwrap();
    assert_ne!(kept.claims.jti, revoked.claims.jti);

    tokens.revoke(&revoked.claims);

    assert!(matches!(
        tokens.verify_at(&revoked.token, T0 + 1),
        Err(TokenError::Revoked)
    ));
    assert!(tokens.verify_at(&kept.token, T0 + 1).is_ok());
}
