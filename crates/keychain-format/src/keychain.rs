//! The public entry point: the `Loaded -> DbKeyKnown -> KeyCachePopulated`
//! state machine.

use std::path::Path;

use keychain_crypto::{KeyCache, UnwrappedKey};
use log::warn;

use crate::dbblob::DbBlob;
use crate::error::{ContainerError, Result};
use crate::header::{ApplicationHeader, RecordHeader, Schema, TableHeader};
use crate::keyblob::KeyBlob;
use crate::records::{
    self, AppleSharePasswordRecord, GenericPasswordRecord, InternetPasswordRecord, PrivateKeyRecord,
    PublicKeyRecord, X509CertificateRecord,
};
use crate::table_index::{TableIndex, TableKind};
use crate::view::BinaryView;

/// The three states an instance can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Loaded,
    DbKeyKnown,
    KeyCachePopulated,
}

/// A loaded keychain file: immutable bytes, a built table index, and
/// whatever unlock state has been reached so far.
pub struct Keychain {
    bytes: Vec<u8>,
    table_index: TableIndex,
    db_blob: Option<DbBlob>,
    db_key: Option<[u8; 24]>,
    key_cache: KeyCache,
    state: LockState,
}

impl Keychain {
    /// Read the whole file into memory and parse the container structure.
    /// Only a bad signature or an I/O failure are fatal here; everything
    /// downstream degrades gracefully.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let view = BinaryView::new(&bytes);
        let app_header = ApplicationHeader::decode(&view)?;
        let schema = Schema::decode(&view, app_header.schema_offset as usize)?;
        let table_index = TableIndex::build(&view, &app_header, &schema)?;
        let db_blob = match Self::load_db_blob(&view, &table_index) {
            Ok(blob) => Some(blob),
            Err(err) => {
                warn!("no usable DB blob: {err}");
                None
            }
        };
        Ok(Self {
            bytes,
            table_index,
            db_blob,
            db_key: None,
            key_cache: KeyCache::new(),
            state: LockState::Loaded,
        })
    }

    fn load_db_blob(view: &BinaryView, table_index: &TableIndex) -> Result<DbBlob> {
        let meta_offset = table_index.offset(TableKind::Meta)?;
        let header = TableHeader::decode(view, meta_offset)?;
        let offsets = header.live_record_offsets(view, meta_offset)?;
        let first = *offsets.first().ok_or(ContainerError::Malformed("meta table has no records"))?;
        let record_start = meta_offset + first as usize;
        let rec_header = RecordHeader::decode(view, record_start)?;
        let blob_bytes = records::lv(view, record_start, rec_header.record_size as usize, &rec_header, 0)
            .ok_or(ContainerError::Malformed("meta record missing DB blob column"))?;
        DbBlob::parse(&blob_bytes)
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// `$keychain$*salt*iv*cipher`, independent of unlock state.
    pub fn password_hash(&self) -> Result<String> {
        self.db_blob.as_ref().map(DbBlob::password_hash).ok_or(ContainerError::TableAbsent)
    }

    pub fn unlock_password(&mut self, password: &str) -> Result<()> {
        let db_blob = self.db_blob.as_ref().ok_or(ContainerError::TableAbsent)?;
        let master = keychain_crypto::derive_master_key(password.as_bytes(), &db_blob.salt, db_blob.pbkdf2_iterations);
        self.accept_master_key(&master)
    }

    /// `--key <hex>`: the master key, given directly as 48 hex characters.
    pub fn unlock_master_key_hex(&mut self, hex_key: &str) -> Result<()> {
        let bytes = hex::decode(hex_key).map_err(|_| ContainerError::Malformed("key is not valid hex"))?;
        let master: [u8; 24] = bytes
            .try_into()
            .map_err(|_| ContainerError::Malformed("hex key must decode to 24 bytes"))?;
        self.accept_master_key(&master)
    }

    /// `--unlock-file`: first 24 bytes are the raw master key, rest ignored.
    pub fn unlock_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < 24 {
            return Err(ContainerError::Malformed("unlock file shorter than 24 bytes"));
        }
        let mut master = [0u8; 24];
        master.copy_from_slice(&bytes[..24]);
        self.accept_master_key(&master)
    }

    fn accept_master_key(&mut self, master: &[u8; 24]) -> Result<()> {
        let db_blob = self.db_blob.as_ref().ok_or(ContainerError::TableAbsent)?;
        let db_key = db_blob.recover_db_key(master)?;
        self.db_key = Some(db_key);
        self.state = LockState::DbKeyKnown;
        self.populate_key_cache(&db_key);
        self.state = LockState::KeyCachePopulated;
        Ok(())
    }

    /// One-shot pass over the `SymmetricKey` table. Absence of that table, or
    /// of any individual key blob, just leaves fewer cache entries; it never
    /// fails the unlock as a whole.
    fn populate_key_cache(&mut self, db_key: &[u8; 24]) {
        let view = BinaryView::new(&self.bytes);
        let Ok(table_offset) = self.table_index.offset(TableKind::SymmetricKey) else {
            self.key_cache.mark_populated();
            return;
        };
        let Ok(header) = TableHeader::decode(&view, table_offset) else {
            self.key_cache.mark_populated();
            return;
        };
        let Ok(record_offsets) = header.live_record_offsets(&view, table_offset) else {
            self.key_cache.mark_populated();
            return;
        };
        for relative in record_offsets {
            let record_start = table_offset + relative as usize;
            let Ok(rec_header) = RecordHeader::decode(&view, record_start) else { continue };
            if rec_header.crypto_offset == 0 {
                continue;
            }
            let area_start = record_start + rec_header.crypto_offset as usize;
            let area_end = record_start + rec_header.record_size as usize;
            let Ok(area) = view.bytes_at(area_start, area_end.saturating_sub(area_start)) else { continue };
            let Ok(key_blob) = KeyBlob::parse(area) else { continue };
            if let Ok(unwrapped) = keychain_crypto::unwrap_symmetric_key(db_key, &key_blob.iv, key_blob.ciphertext) {
                self.key_cache.insert(key_blob.id, UnwrappedKey(unwrapped));
            }
        }
        self.key_cache.mark_populated();
    }

    /// Absolute offsets of every live record in `kind`'s table, or empty if
    /// the table is absent or malformed.
    fn record_starts(&self, kind: TableKind) -> Vec<usize> {
        let view = BinaryView::new(&self.bytes);
        let table_offset = match self.table_index.offset(kind) {
            Ok(off) => off,
            Err(_) => {
                warn!("{kind:?} table absent");
                return Vec::new();
            }
        };
        let header = match TableHeader::decode(&view, table_offset) {
            Ok(h) => h,
            Err(err) => {
                warn!("{kind:?} table header malformed: {err}");
                return Vec::new();
            }
        };
        match header.live_record_offsets(&view, table_offset) {
            Ok(offsets) => offsets.into_iter().map(|o| table_offset + o as usize).collect(),
            Err(err) => {
                warn!("{kind:?} record offset array malformed: {err}");
                Vec::new()
            }
        }
    }

    pub fn generic_passwords(&self) -> impl Iterator<Item = GenericPasswordRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        self.record_starts(TableKind::GenericPassword)
            .into_iter()
            .map(move |start| records::decode_generic_password(&view, start, &self.key_cache))
    }

    pub fn internet_passwords(&self) -> impl Iterator<Item = InternetPasswordRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        self.record_starts(TableKind::InternetPassword)
            .into_iter()
            .map(move |start| records::decode_internet_password(&view, start, &self.key_cache))
    }

    pub fn appleshare_passwords(&self) -> impl Iterator<Item = AppleSharePasswordRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        self.record_starts(TableKind::AppleSharePassword)
            .into_iter()
            .map(move |start| records::decode_appleshare_password(&view, start, &self.key_cache))
    }

    pub fn x509_certificates(&self) -> impl Iterator<Item = X509CertificateRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        self.record_starts(TableKind::X509Certificate)
            .into_iter()
            .map(move |start| records::decode_x509_certificate(&view, start))
    }

    pub fn public_keys(&self) -> impl Iterator<Item = PublicKeyRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        self.record_starts(TableKind::PublicKey)
            .into_iter()
            .map(move |start| records::decode_public_key(&view, start))
    }

    pub fn private_keys(&self) -> impl Iterator<Item = PrivateKeyRecord> + '_ {
        let view = BinaryView::new(&self.bytes);
        let db_key = self.db_key;
        self.record_starts(TableKind::PrivateKey)
            .into_iter()
            .map(move |start| records::decode_private_key(&view, start, db_key.as_ref()))
    }
}
