use sha2::{Digest, Sha256};

const SPAWN_KEY_SUFFIX: &str = "spawn";
const COINS_KEY_SUFFIX: &str = "coins";

/// Maps `key` to a stable value in `[0, 1)`.
///
/// The value is derived from the top 53 bits of the SHA-256 digest of the key,
/// so it is identical across processes and platforms.
pub fn hash_unit(key: &str) -> f64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let bits = u64::from_be_bytes(prefix) >> 11;
    bits as f64 * (1.0 / (1u64 << 53) as f64)
}

pub fn spawn_key(i: i32, j: i32) -> String {
    format!("{i},{j},{SPAWN_KEY_SUFFIX}")
}

pub fn coins_key(i: i32, j: i32) -> String {
    format!("{i},{j},{COINS_KEY_SUFFIX}")
}
