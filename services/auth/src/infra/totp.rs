//! RFC 6238 TOTP: SHA1, 6 digits, 30 s step, one step of skew either way.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthServiceError;

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECS: u64 = 30;

/// A fresh enrollment: base32 secret plus the `otpauth://` URI for QR codes.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub secret: String,
    pub otpauth_url: String,
}

fn build(secret_b32: &str, issuer: &str, account: &str) -> Result<TOTP, AuthServiceError> {
    let bytes = Secret::Encoded(secret_b32.to_owned())
        .to_bytes()
        .map_err(|e| AuthServiceError::Internal(anyhow::anyhow!("decode TOTP secret: {e:?}")))?;
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECS,
        bytes,
        Some(issuer.to_owned()),
        account.to_owned(),
    )
    .map_err(|e| AuthServiceError::Internal(anyhow::anyhow!("init TOTP: {e}")))
}

/// Generate a 160-bit secret for `account`.
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<Enrollment, AuthServiceError> {
    let secret = Secret::generate_secret().to_encoded().to_string();
    let otpauth_url = build(&secret, issuer, account)?.get_url();
    Ok(Enrollment {
        secret,
        otpauth_url,
    })
}

/// Check `code` against the current time window.
pub fn verify_code(
    secret_b32: &str,
    code: &str,
    issuer: &str,
    account: &str,
) -> Result<bool, AuthServiceError> {
    build(secret_b32, issuer, account)?
        .check_current(code.trim())
        .map_err(|e| AuthServiceError::Internal(anyhow::anyhow!("system clock: {e}")))
}

/// Current code for `secret_b32`. Used by tests and tooling.
pub fn current_code(secret_b32: &str, issuer: &str, account: &str) -> Result<String, AuthServiceError> {
    build(secret_b32, issuer, account)?
        .generate_current()
        .map_err(|e| AuthServiceError::Internal(anyhow::anyhow!("system clock: {e}")))
}
