//! Utility functions for group identifiers

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Length of every key produced by [`generate_group_key`].
pub const GROUP_KEY_LEN: usize = 11;

// a random 64-bit value encoded with the url-safe base64 alphabet, no padding
pub fn generate_group_key() -> String {
    let numeric_id: u64 = rand::random();
    URL_SAFE_NO_PAD.encode(numeric_id.to_le_bytes())
}

/// Whether `key` has the shape of a generated group key.
pub fn is_group_key(key: &str) -> bool {
    key.len() == GROUP_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
