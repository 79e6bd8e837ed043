//! Password hashing, grounded on the upstream protocol's credential
//! format: the client never sends a plaintext password, only its
//! hex-encoded MD5 digest, and that digest is what gets bcrypt-hashed
//! and bcrypt-verified server-side.

use md5::{Digest, Md5};

/// Hex-encodes the MD5 digest of `password`, matching the digest the game
/// client itself sends over the wire.
pub fn md5_hex(password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String never fails");
    }
    out
}

/// Hashes an already-md5'd password for storage.
pub fn hash_password(md5_password: &str) -> bcrypt::BcryptResult<String> {
    bcrypt::hash(md5_password, bcrypt::DEFAULT_COST)
}

/// Verifies an md5'd password against a stored bcrypt hash. Malformed
/// stored hashes verify as false rather than propagating an error.
pub fn verify_password(md5_password: &str, bcrypt_hash: &str) -> bool {
    bcrypt::verify(md5_password, bcrypt_hash).unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn password_round_trips_through_md5_then_bcrypt() {
        let digest = md5_hex("hunter2");
        let hash = hash_password(&digest).unwrap();
        assert!(verify_password(&digest, &hash));
        assert!(!verify_password(&md5_hex("wrong"), &hash));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify_password(&md5_hex("hunter2"), "not-a-bcrypt-hash"));
    }
}
