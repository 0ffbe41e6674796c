use sha2::{Digest, Sha256};

/// SHA-256 of the raw upload, lowercase hex. Cache key and archive file stem.
pub fn content_fingerprint(image: &[u8]) -> String {
    format!("{:x}", Sha256::digest(image))
}

/// First four digest bytes read as a big-endian integer.
pub fn fingerprint_seed(image: &[u8]) -> u32 {
    let digest = Sha256::digest(image);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
