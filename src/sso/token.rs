//! Compact HS256 token parsing, verification and signing.
//!
//! Tokens are the usual three dot-separated base64url parts. Verification is
//! pure: replay and claim policy live in their own modules and layer on top.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The only accepted algorithm. Pinned to defeat algorithm-confusion
/// downgrades such as `alg: none`.
pub const TOKEN_ALG: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Claims carried by a login token. Presence rules are enforced by the login
/// state machine so each missing field maps to its own rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Requested post-login return path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("signature does not match any configured secret")]
    NoSecretMatch,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d(part: &str) -> Result<Vec<u8>, TokenError> {
    // Issuers disagree on padding; accept both padded and unpadded parts
    Base64UrlUnpadded::decode_vec(part.trim_end_matches('=')).map_err(|_| TokenError::Base64)
}

fn b64d_json<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, TokenError> {
    let bytes = b64d(part)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Verify a compact token against the candidate secrets in order (active
/// first, then previous) and return the decoded claims plus the index of the
/// secret that matched. Trying both live secrets is what makes zero-downtime
/// rotation work.
///
/// # Errors
///
/// Returns an error if the token is not three dot-separated parts, a part is
/// not valid base64url/JSON, the header algorithm is not `HS256`, or no
/// candidate secret verifies the signature.
pub fn verify_hs256(token: &str, secrets: &[&SecretString]) -> Result<(Claims, usize), TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::Format)?;
    let claims_b64 = parts.next().ok_or(TokenError::Format)?;
    let sig_b64 = parts.next().ok_or(TokenError::Format)?;
    if parts.next().is_some() {
        return Err(TokenError::Format);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != TOKEN_ALG {
        return Err(TokenError::UnsupportedAlg(header.alg));
    }

    let signature = b64d(sig_b64)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    for (index, secret) in secrets.iter().enumerate() {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
            continue;
        };
        mac.update(signing_input.as_bytes());
        // verify_slice is constant-time over the tag bytes
        if mac.verify_slice(&signature).is_ok() {
            let claims: Claims = b64d_json(claims_b64)?;
            return Ok((claims, index));
        }
    }

    Err(TokenError::NoSecretMatch)
}

/// Create an HS256 signed compact token. Used by tests and by operators
/// minting tokens against a staging site.
///
/// # Errors
///
/// Returns an error if the header or claims cannot be JSON-encoded.
pub fn sign_hs256(secret: &SecretString, claims: &Claims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| TokenError::Format)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();
    let sig_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{sig_b64}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn test_claims(jti: &str) -> Claims {
        Claims {
            iss: Some("https://id.example.com".to_string()),
            aud: Some("blog.example.com".to_string()),
            sid: Some("site-1".to_string()),
            sub: Some("alice@example.com".to_string()),
            jti: Some(jti.to_string()),
            iat: Some(NOW),
            exp: Some(NOW + 300),
            rp: Some("/wp-admin/".to_string()),
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), TokenError> {
        let active = secret("active-secret");
        let token = sign_hs256(&active, &test_claims("jti-1"))?;

        let (claims, index) = verify_hs256(&token, &[&active])?;
        assert_eq!(index, 0);
        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
        assert_eq!(claims.sub.as_deref(), Some("alice@example.com"));
        Ok(())
    }

    #[test]
    fn previous_secret_matches_at_index_one() -> Result<(), TokenError> {
        let active = secret("new-secret");
        let previous = secret("old-secret");
        let token = sign_hs256(&previous, &test_claims("jti-2"))?;

        let (_, index) = verify_hs256(&token, &[&active, &previous])?;
        assert_eq!(index, 1);
        Ok(())
    }

    #[test]
    fn unknown_secret_is_rejected() -> Result<(), TokenError> {
        let token = sign_hs256(&secret("neither"), &test_claims("jti-3"))?;
        let active = secret("new-secret");
        let previous = secret("old-secret");

        let result = verify_hs256(&token, &[&active, &previous]);
        assert!(matches!(result, Err(TokenError::NoSecretMatch)));
        Ok(())
    }

    #[test]
    fn algorithm_is_pinned() -> Result<(), TokenError> {
        let key = secret("active-secret");
        // Hand-build a token declaring alg none with an empty signature
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"none"}"#);
        let claims = b64e_json(&test_claims("jti-4"))?;
        let token = format!("{header}.{claims}.");

        let result = verify_hs256(&token, &[&key]);
        assert!(matches!(result, Err(TokenError::UnsupportedAlg(alg)) if alg == "none"));

        // Case matters, hs256 is not HS256
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"hs256"}"#);
        let token = format!("{header}.{claims}.");
        let result = verify_hs256(&token, &[&key]);
        assert!(matches!(result, Err(TokenError::UnsupportedAlg(_))));
        Ok(())
    }

    #[test]
    fn wrong_part_count_is_rejected() {
        let key = secret("s");
        assert!(matches!(
            verify_hs256("only.two", &[&key]),
            Err(TokenError::Format)
        ));
        assert!(matches!(
            verify_hs256("a.b.c.d", &[&key]),
            Err(TokenError::Format)
        ));
    }

    #[test]
    fn garbage_base64_is_rejected() {
        let key = secret("s");
        let result = verify_hs256("!!!.???.###", &[&key]);
        assert!(matches!(result, Err(TokenError::Base64)));
    }

    #[test]
    fn padded_parts_are_accepted() -> Result<(), TokenError> {
        let key = secret("active-secret");
        let token = sign_hs256(&key, &test_claims("jti-5"))?;
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        // Re-pad each part to a multiple of four, some issuers do
        for part in &mut parts {
            while part.len() % 4 != 0 {
                part.push('=');
            }
        }
        let padded = parts.join(".");

        let (claims, _) = verify_hs256(&padded, &[&key])?;
        assert_eq!(claims.jti.as_deref(), Some("jti-5"));
        Ok(())
    }

    #[test]
    fn tampered_payload_is_rejected() -> Result<(), TokenError> {
        let key = secret("active-secret");
        let token = sign_hs256(&key, &test_claims("jti-6"))?;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = b64e_json(&test_claims("jti-forged"))?;
        parts[1] = &forged;
        let forged_token = parts.join(".");

        let result = verify_hs256(&forged_token, &[&key]);
        assert!(matches!(result, Err(TokenError::NoSecretMatch)));
        Ok(())
    }
}
