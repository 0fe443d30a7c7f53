use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

pub const CSRF_TOKEN_BYTES: usize = 32;
pub const CSRF_TOKEN_HEX_LEN: usize = CSRF_TOKEN_BYTES * 2;

/// Fresh token: 32 bytes from the OS CSPRNG as 64 lowercase hex characters.
/// Fails only when the OS entropy source is unavailable.
pub fn generate_csrf_token() -> AppResult<String> {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AppError::internal("entropy_unavailable".to_string(), e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Compare a submitted token with the reference one.
///
/// Both sides are hex-decoded first; empty input, malformed hex and differing decoded lengths
/// are rejected before any comparison. Equal-length inputs go through `subtle`'s constant-time
/// equality so timing does not reveal the first mismatching byte.
pub fn validate_csrf_token(submitted: &str, reference: &str) -> bool {
    if submitted.is_empty() || reference.is_empty() {
        return false;
    }
    let (Ok(a), Ok(b)) = (hex::decode(submitted), hex::decode(reference)) else {
        return false;
    };
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(&b).into()
}
