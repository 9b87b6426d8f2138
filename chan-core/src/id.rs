//! Prefixed random identifiers.
//!
//! IDs look like `acct_<base64url>` and carry 96 bits of entropy.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::RngCore;

const ID_ENTROPY_BYTES: usize = 12;

/// Generate a prefixed ID with 96 bits of entropy.
///
/// # Example
/// ```
/// use chan_core::id::generate_prefixed_id;
///
/// let id = generate_prefixed_id("acct");
/// assert!(id.starts_with("acct_"));
/// ```
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of
/// base64url data.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= ID_ENTROPY_BYTES,
        Err(_) => false,
    }
}
