//! Crypto core for the legacy macOS keychain forensic reader.
//!
//! This crate has no knowledge of the container file format; it is handed
//! raw key/IV/ciphertext byte slices by `keychain-format` and returns either
//! key material or [`CryptoError`]. Nothing here ever panics on malformed
//! input — callers downgrade a failure to a locked record rather than
//! aborting the whole read.

mod cache;
mod des3;
mod error;
mod kdf;
mod unwrap;

pub use cache::{KeyCache, KeyId, UnwrappedKey};
pub use des3::{decrypt_cbc, MAGIC_CMS_IV};
pub use error::CryptoError;
pub use kdf::{derive_master_key, KEY_LEN, PBKDF2_ITERATIONS};
pub use unwrap::{recover_db_key, unwrap_private_key, unwrap_symmetric_key, UnwrappedPrivateKey};
