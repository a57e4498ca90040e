//! Record decoding: the six public record kinds plus their lazy iterators.

use keychain_crypto::{KeyCache, KeyId};
use log::debug;

use crate::column::{extract, ColumnKind, ColumnValue};
use crate::header::RecordHeader;
use crate::keyblob::SsgpBlob;
use crate::view::BinaryView;

/// The state of a password field: decrypted, locked, or (for non-printable
/// plaintext) base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordState {
    Locked,
    Plaintext(String),
    Base64(String),
}

/// The state of a private-key body: unwrapped bytes, or locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Locked,
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericPasswordRecord {
    pub account: Option<Vec<u8>>,
    pub service: Option<Vec<u8>>,
    pub label: Option<Vec<u8>>,
    pub description: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub password: PasswordState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternetPasswordRecord {
    pub account: Option<Vec<u8>>,
    pub server: Option<Vec<u8>>,
    pub protocol: Option<[u8; 4]>,
    pub port: Option<i32>,
    pub path: Option<Vec<u8>>,
    pub security_domain: Option<Vec<u8>>,
    pub label: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub password: PasswordState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleSharePasswordRecord {
    pub account: Option<Vec<u8>>,
    pub server: Option<Vec<u8>>,
    pub signature: Option<[u8; 4]>,
    /// Some readers format this as an integer, but the header declares it
    /// as length-value; treated as LV here and left for a collaborator
    /// formatter to interpret.
    pub address: Option<Vec<u8>>,
    pub label: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub password: PasswordState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509CertificateRecord {
    pub label: Option<Vec<u8>>,
    pub der: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyRecord {
    pub label: Option<Vec<u8>>,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKeyRecord {
    pub label: Option<Vec<u8>>,
    pub print_name: Option<Vec<u8>>,
    pub key: KeyMaterial,
}

/// The public record-value contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    GenericPassword(GenericPasswordRecord),
    InternetPassword(InternetPasswordRecord),
    AppleSharePassword(AppleSharePasswordRecord),
    X509Certificate(X509CertificateRecord),
    PublicKey(PublicKeyRecord),
    PrivateKey(PrivateKeyRecord),
}

pub(crate) fn lv(view: &BinaryView, record_start: usize, record_size: usize, header: &RecordHeader, idx: usize) -> Option<Vec<u8>> {
    match extract(view, record_start, record_size, header.column(idx), ColumnKind::LengthValue) {
        ColumnValue::Bytes(b) => Some(b),
        _ => None,
    }
}

fn fourcc(view: &BinaryView, record_start: usize, record_size: usize, header: &RecordHeader, idx: usize) -> Option<[u8; 4]> {
    match extract(view, record_start, record_size, header.column(idx), ColumnKind::FourCc) {
        ColumnValue::FourCc(f) => Some(f),
        _ => None,
    }
}

fn int(view: &BinaryView, record_start: usize, record_size: usize, header: &RecordHeader, idx: usize) -> Option<i32> {
    match extract(view, record_start, record_size, header.column(idx), ColumnKind::Int) {
        ColumnValue::Int(v) => Some(v),
        _ => None,
    }
}

/// Decrypt the SSGP blob found at `header.crypto_offset`, resolving the
/// per-record key through `cache`. A cache miss or decrypt failure yields
/// `Locked`, never an error.
fn resolve_password(view: &BinaryView, record_start: usize, record_size: usize, header: &RecordHeader, cache: &KeyCache) -> PasswordState {
    if header.crypto_offset == 0 {
        return PasswordState::Locked;
    }
    let area_start = record_start + header.crypto_offset as usize;
    let area_end = record_start + record_size;
    let area = match view.bytes_at(area_start, area_end.saturating_sub(area_start)) {
        Ok(a) => a,
        Err(_) => return PasswordState::Locked,
    };
    let ssgp = match SsgpBlob::parse(area) {
        Ok(b) => b,
        Err(err) => {
            debug!("SSGP blob at {area_start:#x} malformed: {err}");
            return PasswordState::Locked;
        }
    };
    let key: KeyId = ssgp.id;
    let unwrapped = match cache.get(&key) {
        Some(k) => k,
        None => {
            debug!("no cached key for SSGP blob at {area_start:#x}");
            return PasswordState::Locked;
        }
    };
    match keychain_crypto::decrypt_cbc(unwrapped.as_ref(), &ssgp.iv, ssgp.ciphertext) {
        Ok(plaintext) => {
            if plaintext.iter().all(|&b| is_printable_ascii(b)) {
                PasswordState::Plaintext(String::from_utf8(plaintext).unwrap_or_default())
            } else {
                use base64::Engine;
                PasswordState::Base64(base64::engine::general_purpose::STANDARD.encode(plaintext))
            }
        }
        Err(_) => PasswordState::Locked,
    }
}

/// Visible ASCII plus the five whitespace control codes (tab, LF, VT, FF,
/// CR) — the same byte set Python's `string.printable` covers.
fn is_printable_ascii(b: u8) -> bool {
    (0x20..0x7f).contains(&b) || matches!(b, 0x09..=0x0d)
}

fn resolve_private_key(view: &BinaryView, record_start: usize, record_size: usize, header: &RecordHeader, db_key: Option<&[u8; 24]>) -> KeyMaterial {
    let db_key = match db_key {
        Some(k) => k,
        None => return KeyMaterial::Locked,
    };
    if header.crypto_offset == 0 {
        return KeyMaterial::Locked;
    }
    let area_start = record_start + header.crypto_offset as usize;
    let area_end = record_start + record_size;
    let area = match view.bytes_at(area_start, area_end.saturating_sub(area_start)) {
        Ok(a) if a.len() >= 8 => a,
        _ => return KeyMaterial::Locked,
    };
    let mut iv = [0u8; 8];
    iv.copy_from_slice(&area[0..8]);
    let ciphertext = &area[8..];
    match keychain_crypto::unwrap_private_key(db_key, &iv, ciphertext) {
        Ok(unwrapped) => KeyMaterial::Bytes(unwrapped.private_key_blob),
        Err(_) => KeyMaterial::Locked,
    }
}

/// Column indices, fixed per record kind.
mod col {
    pub mod generic {
        pub const ACCOUNT: usize = 0;
        pub const SERVICE: usize = 1;
        pub const LABEL: usize = 2;
        pub const DESCRIPTION: usize = 3;
        pub const COMMENT: usize = 4;
    }
    pub mod internet {
        pub const ACCOUNT: usize = 0;
        pub const SERVER: usize = 1;
        pub const PROTOCOL: usize = 2;
        pub const PORT: usize = 3;
        pub const PATH: usize = 4;
        pub const SECURITY_DOMAIN: usize = 5;
        pub const LABEL: usize = 6;
        pub const COMMENT: usize = 7;
    }
    pub mod appleshare {
        pub const ACCOUNT: usize = 0;
        pub const SERVER: usize = 1;
        pub const SIGNATURE: usize = 2;
        pub const ADDRESS: usize = 3;
        pub const LABEL: usize = 4;
        pub const COMMENT: usize = 5;
    }
    pub mod cert_or_key {
        pub const LABEL: usize = 0;
        pub const DATA: usize = 1;
    }
    pub mod private_key {
        pub const LABEL: usize = 0;
        pub const PRINT_NAME: usize = 1;
    }
}

pub fn decode_generic_password(view: &BinaryView, record_start: usize, cache: &KeyCache) -> GenericPasswordRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => return GenericPasswordRecord { account: None, service: None, label: None, description: None, comment: None, password: PasswordState::Locked },
    };
    let size = header.record_size as usize;
    GenericPasswordRecord {
        account: lv(view, record_start, size, &header, col::generic::ACCOUNT),
        service: lv(view, record_start, size, &header, col::generic::SERVICE),
        label: lv(view, record_start, size, &header, col::generic::LABEL),
        description: lv(view, record_start, size, &header, col::generic::DESCRIPTION),
        comment: lv(view, record_start, size, &header, col::generic::COMMENT),
        password: resolve_password(view, record_start, size, &header, cache),
    }
}

pub fn decode_internet_password(view: &BinaryView, record_start: usize, cache: &KeyCache) -> InternetPasswordRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => {
            return InternetPasswordRecord {
                account: None, server: None, protocol: None, port: None, path: None,
                security_domain: None, label: None, comment: None, password: PasswordState::Locked,
            }
        }
    };
    let size = header.record_size as usize;
    InternetPasswordRecord {
        account: lv(view, record_start, size, &header, col::internet::ACCOUNT),
        server: lv(view, record_start, size, &header, col::internet::SERVER),
        protocol: fourcc(view, record_start, size, &header, col::internet::PROTOCOL),
        port: int(view, record_start, size, &header, col::internet::PORT),
        path: lv(view, record_start, size, &header, col::internet::PATH),
        security_domain: lv(view, record_start, size, &header, col::internet::SECURITY_DOMAIN),
        label: lv(view, record_start, size, &header, col::internet::LABEL),
        comment: lv(view, record_start, size, &header, col::internet::COMMENT),
        password: resolve_password(view, record_start, size, &header, cache),
    }
}

pub fn decode_appleshare_password(view: &BinaryView, record_start: usize, cache: &KeyCache) -> AppleSharePasswordRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => {
            return AppleSharePasswordRecord {
                account: None, server: None, signature: None, address: None,
                label: None, comment: None, password: PasswordState::Locked,
            }
        }
    };
    let size = header.record_size as usize;
    AppleSharePasswordRecord {
        account: lv(view, record_start, size, &header, col::appleshare::ACCOUNT),
        server: lv(view, record_start, size, &header, col::appleshare::SERVER),
        signature: fourcc(view, record_start, size, &header, col::appleshare::SIGNATURE),
        address: lv(view, record_start, size, &header, col::appleshare::ADDRESS),
        label: lv(view, record_start, size, &header, col::appleshare::LABEL),
        comment: lv(view, record_start, size, &header, col::appleshare::COMMENT),
        password: resolve_password(view, record_start, size, &header, cache),
    }
}

pub fn decode_x509_certificate(view: &BinaryView, record_start: usize) -> X509CertificateRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => return X509CertificateRecord { label: None, der: None },
    };
    let size = header.record_size as usize;
    X509CertificateRecord {
        label: lv(view, record_start, size, &header, col::cert_or_key::LABEL),
        der: lv(view, record_start, size, &header, col::cert_or_key::DATA),
    }
}

pub fn decode_public_key(view: &BinaryView, record_start: usize) -> PublicKeyRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => return PublicKeyRecord { label: None, data: None },
    };
    let size = header.record_size as usize;
    PublicKeyRecord {
        label: lv(view, record_start, size, &header, col::cert_or_key::LABEL),
        data: lv(view, record_start, size, &header, col::cert_or_key::DATA),
    }
}

pub fn decode_private_key(view: &BinaryView, record_start: usize, db_key: Option<&[u8; 24]>) -> PrivateKeyRecord {
    let header = match RecordHeader::decode(view, record_start) {
        Ok(h) => h,
        Err(_) => return PrivateKeyRecord { label: None, print_name: None, key: KeyMaterial::Locked },
    };
    let size = header.record_size as usize;
    PrivateKeyRecord {
        label: lv(view, record_start, size, &header, col::private_key::LABEL),
        print_name: lv(view, record_start, size, &header, col::private_key::PRINT_NAME),
        key: resolve_private_key(view, record_start, size, &header, db_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keychain_crypto::UnwrappedKey;

    fn lv_bytes(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(payload);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn build_generic_password_record(account: &[u8], service: &[u8], ssgp: Option<&[u8]>) -> Vec<u8> {
        let column_count = 5u32;
        let mut payload = Vec::new();
        let account_col = RecordHeader::PREFACE_LEN + column_count as usize * 4;
        let account_lv = lv_bytes(account);
        let service_off = account_col + account_lv.len();
        let service_lv = lv_bytes(service);
        payload.extend_from_slice(&account_lv);
        payload.extend_from_slice(&service_lv);
        let mut crypto_offset = 0u32;
        if let Some(ssgp_bytes) = ssgp {
            crypto_offset = (service_off + service_lv.len()) as u32;
            payload.extend_from_slice(ssgp_bytes);
        }
        let record_size = (RecordHeader::PREFACE_LEN + column_count as usize * 4 + payload.len()) as u32;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record_size.to_be_bytes());
        bytes.extend_from_slice(&crypto_offset.to_be_bytes());
        bytes.extend_from_slice(&column_count.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&(account_col as u32).to_be_bytes());
        bytes.extend_from_slice(&(service_off as u32).to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes()); // label absent
        bytes.extend_from_slice(&0u32.to_be_bytes()); // description absent
        bytes.extend_from_slice(&0u32.to_be_bytes()); // comment absent
        bytes.extend_from_slice(&payload);
        bytes
    }

    #[test]
    fn decodes_plaintext_password_when_key_cached() {
        let key = [9u8; 24];
        let iv = [1u8; 8];
        let plaintext = b"hunter2".to_vec();

        // Build the SSGP blob by encrypting with the same RustCrypto primitives
        // `keychain_crypto::decrypt_cbc` uses under the hood.
        use cipher::block_padding::Pkcs7;
        use cipher::generic_array::GenericArray;
        use cipher::{BlockEncryptMut, KeyIvInit};
        let key_ga = GenericArray::from_slice(&key);
        let iv_ga = GenericArray::from_slice(&iv);
        let ct = cbc::Encryptor::<des::TdesEde3>::new(key_ga, iv_ga).encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        let label = [5u8; 20];
        let mut ssgp_bytes = Vec::new();
        ssgp_bytes.extend_from_slice(b"ssgp");
        ssgp_bytes.extend_from_slice(&label);
        ssgp_bytes.extend_from_slice(&iv);
        ssgp_bytes.extend_from_slice(&ct);

        let record = build_generic_password_record(b"alice", b"svc", Some(&ssgp_bytes));
        let view = BinaryView::new(&record);

        let mut cache = KeyCache::new();
        let mut id = [0u8; 24];
        id[0..4].copy_from_slice(b"ssgp");
        id[4..24].copy_from_slice(&label);
        cache.insert(id, UnwrappedKey(key));

        let decoded = decode_generic_password(&view, 0, &cache);
        assert_eq!(decoded.account, Some(b"alice".to_vec()));
        assert_eq!(decoded.service, Some(b"svc".to_vec()));
        assert_eq!(decoded.password, PasswordState::Plaintext("hunter2".to_string()));
    }

    #[test]
    fn tab_and_newline_bytes_still_count_as_plaintext() {
        let key = [9u8; 24];
        let iv = [1u8; 8];
        let plaintext = b"line1\tline2\n".to_vec();

        use cipher::block_padding::Pkcs7;
        use cipher::generic_array::GenericArray;
        use cipher::{BlockEncryptMut, KeyIvInit};
        let key_ga = GenericArray::from_slice(&key);
        let iv_ga = GenericArray::from_slice(&iv);
        let ct = cbc::Encryptor::<des::TdesEde3>::new(key_ga, iv_ga).encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        let label = [5u8; 20];
        let mut ssgp_bytes = Vec::new();
        ssgp_bytes.extend_from_slice(b"ssgp");
        ssgp_bytes.extend_from_slice(&label);
        ssgp_bytes.extend_from_slice(&iv);
        ssgp_bytes.extend_from_slice(&ct);

        let record = build_generic_password_record(b"alice", b"svc", Some(&ssgp_bytes));
        let view = BinaryView::new(&record);

        let mut cache = KeyCache::new();
        let mut id = [0u8; 24];
        id[0..4].copy_from_slice(b"ssgp");
        id[4..24].copy_from_slice(&label);
        cache.insert(id, UnwrappedKey(key));

        let decoded = decode_generic_password(&view, 0, &cache);
        assert_eq!(decoded.password, PasswordState::Plaintext("line1\tline2\n".to_string()));
    }

    #[test]
    fn missing_key_yields_locked_password() {
        let label = [5u8; 20];
        let mut ssgp_bytes = Vec::new();
        ssgp_bytes.extend_from_slice(b"ssgp");
        ssgp_bytes.extend_from_slice(&label);
        ssgp_bytes.extend_from_slice(&[0u8; 8]);
        ssgp_bytes.extend_from_slice(&[0u8; 8]);

        let record = build_generic_password_record(b"alice", b"svc", Some(&ssgp_bytes));
        let view = BinaryView::new(&record);
        let cache = KeyCache::new();
        let decoded = decode_generic_password(&view, 0, &cache);
        assert_eq!(decoded.password, PasswordState::Locked);
    }

    #[test]
    fn no_ssgp_area_yields_locked_password() {
        let record = build_generic_password_record(b"alice", b"svc", None);
        let view = BinaryView::new(&record);
        let cache = KeyCache::new();
        let decoded = decode_generic_password(&view, 0, &cache);
        assert_eq!(decoded.password, PasswordState::Locked);
    }
}
