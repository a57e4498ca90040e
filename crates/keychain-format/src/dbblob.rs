//! The DB blob: the encrypted database-key container living in the meta table.

use keychain_crypto::CryptoError;

use crate::error::{ContainerError, Result};

/// Decoded DB blob: the encrypted container holding the database key.
#[derive(Debug, Clone)]
pub struct DbBlob {
    pub version: u32,
    pub crypto_offset: u32,
    pub total_length: u32,
    pub random_signature: [u8; 16],
    pub sequence: u32,
    pub pbkdf2_iterations: u32,
    pub salt: [u8; 20],
    pub iv: [u8; 8],
    raw: Vec<u8>,
}

impl DbBlob {
    pub const FIXED_HEADER_LEN: usize = 64;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::FIXED_HEADER_LEN {
            return Err(ContainerError::Malformed("DB blob shorter than its fixed header"));
        }
        let version = be_u32(bytes, 0);
        let crypto_offset = be_u32(bytes, 4);
        let total_length = be_u32(bytes, 8);
        let mut random_signature = [0u8; 16];
        random_signature.copy_from_slice(&bytes[12..28]);
        let sequence = be_u32(bytes, 28);
        let pbkdf2_iterations = be_u32(bytes, 32);
        let mut salt = [0u8; 20];
        salt.copy_from_slice(&bytes[36..56]);
        let mut iv = [0u8; 8];
        iv.copy_from_slice(&bytes[56..64]);

        if crypto_offset as usize > total_length as usize || total_length as usize > bytes.len() {
            return Err(ContainerError::Malformed("DB blob crypto_offset/total_length out of range"));
        }

        Ok(Self {
            version,
            crypto_offset,
            total_length,
            random_signature,
            sequence,
            pbkdf2_iterations,
            salt,
            iv,
            raw: bytes.to_vec(),
        })
    }

    /// The ciphertext region: `[crypto_offset, total_length)`.
    pub fn ciphertext(&self) -> &[u8] {
        &self.raw[self.crypto_offset as usize..self.total_length as usize]
    }

    /// Recover the database key, given the PBKDF2-derived master key.
    pub fn recover_db_key(&self, master_key: &[u8; 24]) -> std::result::Result<[u8; 24], CryptoError> {
        keychain_crypto::recover_db_key(master_key, &self.iv, self.ciphertext())
    }

    /// `$keychain$*salt_hex*iv_hex*cipher_hex`. Purely a function of this
    /// blob's bytes, and idempotent.
    pub fn password_hash(&self) -> String {
        format!(
            "$keychain$*{}*{}*{}",
            hex::encode(self.salt),
            hex::encode(self.iv),
            hex::encode(self.ciphertext())
        )
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
