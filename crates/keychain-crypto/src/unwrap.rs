//! DB-key recovery and the two-stage CMS-reverse-CBC key unwrap.

use crate::des3::{decrypt_cbc, MAGIC_CMS_IV};
use crate::error::CryptoError;
use crate::kdf::KEY_LEN;

/// Recover the 24-byte database key from the 24-byte master key and the DB
/// blob's `(iv, ciphertext)` pair.
pub fn recover_db_key(
    master_key: &[u8; KEY_LEN],
    db_blob_iv: &[u8; 8],
    db_blob_ciphertext: &[u8],
) -> Result<[u8; KEY_LEN], CryptoError> {
    let plaintext = decrypt_cbc(master_key, db_blob_iv, db_blob_ciphertext)?;
    if plaintext.len() < KEY_LEN {
        return Err(CryptoError::UnlockFailed);
    }
    let mut db_key = [0u8; KEY_LEN];
    db_key.copy_from_slice(&plaintext[..KEY_LEN]);
    Ok(db_key)
}

/// Shared shape of the "wrapKeyCms" construction: decrypt under the fixed
/// CMS IV, reverse (a prefix of, or all of) the resulting plaintext
/// byte-wise, then decrypt that reversed buffer under the record's own IV.
fn cms_reverse_unwrap(
    db_key: &[u8; KEY_LEN],
    record_iv: &[u8; 8],
    ciphertext: &[u8],
    reverse_len: Option<usize>,
) -> Result<Vec<u8>, CryptoError> {
    let stage1 = decrypt_cbc(db_key, &MAGIC_CMS_IV, ciphertext)?;
    let span: &[u8] = match reverse_len {
        Some(n) => stage1.get(..n).ok_or(CryptoError::DecryptFailed)?,
        None => &stage1[..],
    };
    let mut reversed = span.to_vec();
    reversed.reverse();
    decrypt_cbc(db_key, record_iv, &reversed)
}

/// Unwrap a symmetric-key record's key blob into its 24-byte key.
pub fn unwrap_symmetric_key(
    db_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Result<[u8; KEY_LEN], CryptoError> {
    let stage2 = cms_reverse_unwrap(db_key, iv, ciphertext, Some(32))?;
    let tail = stage2.get(4..).ok_or(CryptoError::DecryptFailed)?;
    tail.try_into().map_err(|_| CryptoError::DecryptFailed)
}

/// Result of unwrapping a private-key record's blob.
pub struct UnwrappedPrivateKey {
    pub key_name: [u8; 12],
    pub private_key_blob: Vec<u8>,
}

/// Unwrap a private-key record's blob directly under the database key.
pub fn unwrap_private_key(
    db_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Result<UnwrappedPrivateKey, CryptoError> {
    let stage2 = cms_reverse_unwrap(db_key, iv, ciphertext, None)?;
    if stage2.len() < 12 {
        return Err(CryptoError::DecryptFailed);
    }
    let mut key_name = [0u8; 12];
    key_name.copy_from_slice(&stage2[..12]);
    Ok(UnwrappedPrivateKey {
        key_name,
        private_key_blob: stage2[12..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::des3::tests_support::encrypt_cbc;

    #[test]
    fn recovers_db_key_from_master() {
        let master = [1u8; 24];
        let iv = [2u8; 8];
        let mut plaintext = [0u8; 24];
        plaintext.copy_from_slice(&[9u8; 24]);
        let ct = encrypt_cbc(&master, &iv, &plaintext);
        let db_key = recover_db_key(&master, &iv, &ct).unwrap();
        assert_eq!(db_key, plaintext);
    }

    #[test]
    fn short_plaintext_is_unlock_failed() {
        let master = [1u8; 24];
        let iv = [2u8; 8];
        let ct = encrypt_cbc(&master, &iv, &[9u8; 8]);
        assert_eq!(recover_db_key(&master, &iv, &ct).unwrap_err(), CryptoError::UnlockFailed);
    }

    #[test]
    fn round_trips_symmetric_key_unwrap() {
        let db_key = [5u8; 24];
        let record_iv = [6u8; 8];
        let real_key = [7u8; 24];

        // Work backwards from the plaintext the unwrap is supposed to recover to a
        // wire ciphertext shaped the way `unwrap_symmetric_key` expects to peel it apart.
        let mut stage2_plain = vec![0u8; 4];
        stage2_plain.extend_from_slice(&real_key);
        let stage2_ciphertext = encrypt_cbc(&db_key, &record_iv, &stage2_plain);
        assert_eq!(stage2_ciphertext.len(), 32);

        let mut stage1_plain = stage2_ciphertext.clone();
        stage1_plain.reverse();
        let wire_ciphertext = encrypt_cbc(&db_key, &MAGIC_CMS_IV, &stage1_plain);

        let unwrapped = unwrap_symmetric_key(&db_key, &record_iv, &wire_ciphertext).unwrap();
        assert_eq!(unwrapped, real_key);
    }
}
