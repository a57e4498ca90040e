//! Triple-DES CBC decryption with strict PKCS#7 padding validation.

use cipher::block_padding::Pkcs7;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, KeyIvInit};
use des::TdesEde3;

use crate::error::CryptoError;

/// The fixed IV used for the first CBC stage of the key-blob / private-key unwrap.
pub const MAGIC_CMS_IV: [u8; 8] = [0x4a, 0xdd, 0xa2, 0x2c, 0x79, 0xe8, 0x21, 0x05];

/// Decrypt `ciphertext` under `(key, iv)` and validate PKCS#7 padding.
///
/// Some keychain readers test the trailing pad byte with a bare `pad > 8`
/// comparison, which silently accepts `pad == 0`. This enforces the standard
/// `1..=8` rule instead; callers that need bug-for-bug parity with that
/// looser check must reproduce it themselves.
pub fn decrypt_cbc(key: &[u8; 24], iv: &[u8; 8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % 8 != 0 {
        return Err(CryptoError::DecryptFailed);
    }
    let key = GenericArray::from_slice(key);
    let iv = GenericArray::from_slice(iv);
    let mut buf = ciphertext.to_vec();
    cbc::Decryptor::<TdesEde3>::new(key, iv)
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map(|plaintext| plaintext.to_vec())
        .map_err(|_| CryptoError::DecryptFailed)
}
