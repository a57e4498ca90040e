//! PBKDF2-HMAC-SHA1 master-key derivation.

/// Iteration count used by DB blobs that predate the per-blob field, and the
/// fallback when a blob declares zero iterations.
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// Width of the derived master key / database key / per-record symmetric key.
pub const KEY_LEN: usize = 24;

/// Derive the 24-byte master key from the user's password, the DB blob's
/// salt, and its declared iteration count (`0` falls back to
/// [`PBKDF2_ITERATIONS`]).
pub fn derive_master_key(password: &[u8], salt: &[u8; 20], iterations: u32) -> [u8; KEY_LEN] {
    let iterations = if iterations == 0 { PBKDF2_ITERATIONS } else { iterations };
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<sha1::Sha1>(password, salt, iterations, &mut out);
    out
}
