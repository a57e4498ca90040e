//! Key blob (symmetric-key records) and SSGP blob (password payload) layouts.

use keychain_crypto::KeyId;

use crate::error::{ContainerError, Result};

/// The wrapped per-record symmetric key, as stored in a `SymmetricKey` table
/// record: a 24-byte common preface (magic `ssgp`), an 8-byte IV, ciphertext
/// to `total_length`, then a 20-byte label at `total_length + 8`.
pub struct KeyBlob<'a> {
    pub iv: [u8; 8],
    pub ciphertext: &'a [u8],
    pub id: KeyId,
}

impl<'a> KeyBlob<'a> {
    pub const COMMON_LEN: usize = 24;

    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < Self::COMMON_LEN + 8 {
            return Err(ContainerError::Malformed("key blob shorter than common preface + iv"));
        }
        let magic: [u8; 4] = bytes[0..4].try_into().unwrap();
        if &magic != b"ssgp" {
            return Err(ContainerError::Malformed("key blob magic is not 'ssgp'"));
        }
        let total_length = u32::from_be_bytes(bytes[12..16].try_into().unwrap()) as usize;
        if total_length > bytes.len() || total_length < Self::COMMON_LEN + 8 {
            return Err(ContainerError::Malformed("key blob total_length out of range"));
        }
        let mut iv = [0u8; 8];
        iv.copy_from_slice(&bytes[24..32]);
        let ciphertext = &bytes[32..total_length];

        let label_start = total_length + 8;
        let label_end = label_start + 20;
        if label_end > bytes.len() {
            return Err(ContainerError::Malformed("key blob label escapes buffer"));
        }
        let mut id = [0u8; 24];
        id[0..4].copy_from_slice(&magic);
        id[4..24].copy_from_slice(&bytes[label_start..label_end]);

        Ok(Self { iv, ciphertext, id })
    }
}

/// The encrypted password payload embedded in password-kind records: 4-byte
/// magic `ssgp` + 20-byte label + 8-byte IV + ciphertext to end of payload.
pub struct SsgpBlob<'a> {
    pub iv: [u8; 8],
    pub ciphertext: &'a [u8],
    pub id: KeyId,
}

impl<'a> SsgpBlob<'a> {
    pub const PREFACE_LEN: usize = 32;

    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < Self::PREFACE_LEN {
            return Err(ContainerError::Malformed("SSGP blob shorter than its preface"));
        }
        let magic: [u8; 4] = bytes[0..4].try_into().unwrap();
        if &magic != b"ssgp" {
            return Err(ContainerError::Malformed("SSGP blob magic is not 'ssgp'"));
        }
        let mut id = [0u8; 24];
        id[0..4].copy_from_slice(&magic);
        id[4..24].copy_from_slice(&bytes[4..24]);
        let mut iv = [0u8; 8];
        iv.copy_from_slice(&bytes[24..32]);
        let ciphertext = &bytes[32..];
        Ok(Self { iv, ciphertext, id })
    }
}
