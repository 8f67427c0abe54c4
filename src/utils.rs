use sha1::{Digest, Sha1};

/// Hex-encoded SHA-1 digest of a string. Fixture filenames and cache keys
/// are derived from this, so the encoding must stay stable.
pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(40);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
