//! Synthetic whole-file fixture builder shared by the CLI integration tests,
//! following the same recipe as `keychain-format`'s own `tests/whole_file.rs`.
#![allow(dead_code)]

use cipher::block_padding::Pkcs7;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncryptMut, KeyIvInit};
use des::TdesEde3;

pub const UNLOCK_PASSWORD: &str = "hunter2";
pub const SALT: [u8; 20] = [0x11; 20];
const DB_KEY: [u8; 24] = [9; 24];
const DB_IV: [u8; 8] = [2; 8];
const SYM_IV: [u8; 8] = [6; 8];
const ACCOUNT_KEY: [u8; 24] = [7; 24];
const SSGP_IV: [u8; 8] = [3; 8];
const SSGP_LABEL: [u8; 20] = [5; 20];

fn encrypt_cbc(key: &[u8; 24], iv: &[u8; 8], plaintext: &[u8]) -> Vec<u8> {
    let key = GenericArray::from_slice(key);
    let iv = GenericArray::from_slice(iv);
    cbc::Encryptor::<TdesEde3>::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn be32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

fn lv_bytes(payload: &[u8]) -> Vec<u8> {
    let mut out = be32(payload.len() as u32).to_vec();
    out.extend_from_slice(payload);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn wrap_key_cms(db_key: &[u8; 24], record_iv: &[u8; 8], stage2_plain: &[u8]) -> Vec<u8> {
    let stage2_ciphertext = encrypt_cbc(db_key, record_iv, stage2_plain);
    let mut stage1_plain = stage2_ciphertext;
    stage1_plain.reverse();
    encrypt_cbc(db_key, &keychain_crypto::MAGIC_CMS_IV, &stage1_plain)
}

fn build_table(table_id: u32, record: &[u8]) -> Vec<u8> {
    let table_size = 16 + 4 + record.len();
    let mut table = Vec::new();
    table.extend_from_slice(&be32(table_size as u32));
    table.extend_from_slice(&be32(table_id));
    table.extend_from_slice(&be32(1));
    table.extend_from_slice(&be32(0));
    table.extend_from_slice(&be32(20));
    table.extend_from_slice(record);
    table
}

/// One keychain file: a DB blob unlockable with [`UNLOCK_PASSWORD`], one
/// symmetric-key record, and one generic password record whose plaintext is
/// `account_password`.
pub fn build_file(account_password: &[u8]) -> Vec<u8> {
    let master = keychain_crypto::derive_master_key(UNLOCK_PASSWORD.as_bytes(), &SALT, 1000);

    let db_ciphertext = encrypt_cbc(&master, &DB_IV, &DB_KEY);
    let mut db_blob = vec![0u8; 64];
    db_blob[0..4].copy_from_slice(&be32(1));
    db_blob[4..8].copy_from_slice(&be32(64));
    db_blob[8..12].copy_from_slice(&be32((64 + db_ciphertext.len()) as u32));
    db_blob[28..32].copy_from_slice(&be32(7));
    db_blob[32..36].copy_from_slice(&be32(1000));
    db_blob[36..56].copy_from_slice(&SALT);
    db_blob[56..64].copy_from_slice(&DB_IV);
    db_blob.extend_from_slice(&db_ciphertext);

    let db_blob_lv = lv_bytes(&db_blob);
    let meta_preface_and_columns = 16 + 4;
    let meta_record_size = meta_preface_and_columns + db_blob_lv.len();
    let mut meta_record = Vec::new();
    meta_record.extend_from_slice(&be32(meta_record_size as u32));
    meta_record.extend_from_slice(&be32(0));
    meta_record.extend_from_slice(&be32(1));
    meta_record.extend_from_slice(&be32(0));
    meta_record.extend_from_slice(&be32(meta_preface_and_columns as u32));
    meta_record.extend_from_slice(&db_blob_lv);
    let meta_table = build_table(0x0000_0001, &meta_record);

    let mut stage2_plain = vec![0u8; 4];
    stage2_plain.extend_from_slice(&ACCOUNT_KEY);
    let wire_ciphertext = wrap_key_cms(&DB_KEY, &SYM_IV, &stage2_plain);

    let mut key_blob = vec![0u8; 24];
    key_blob[0..4].copy_from_slice(b"ssgp");
    let total_length = (24 + wire_ciphertext.len()) as u32;
    key_blob[12..16].copy_from_slice(&be32(total_length));
    key_blob.extend_from_slice(&SYM_IV);
    key_blob.extend_from_slice(&wire_ciphertext);
    key_blob.extend_from_slice(&[0u8; 8]);
    key_blob.extend_from_slice(&SSGP_LABEL);

    let sym_record_size = 16 + key_blob.len();
    let mut sym_record = Vec::new();
    sym_record.extend_from_slice(&be32(sym_record_size as u32));
    sym_record.extend_from_slice(&be32(16));
    sym_record.extend_from_slice(&be32(0));
    sym_record.extend_from_slice(&be32(0));
    sym_record.extend_from_slice(&key_blob);
    let sym_table = build_table(0x0000_0016, &sym_record);

    let account_lv = lv_bytes(b"alice");
    let service_lv = lv_bytes(b"svc");
    let ssgp_ciphertext = encrypt_cbc(&ACCOUNT_KEY, &SSGP_IV, account_password);
    let mut ssgp_blob = Vec::new();
    ssgp_blob.extend_from_slice(b"ssgp");
    ssgp_blob.extend_from_slice(&SSGP_LABEL);
    ssgp_blob.extend_from_slice(&SSGP_IV);
    ssgp_blob.extend_from_slice(&ssgp_ciphertext);

    let columns_start = 16 + 5 * 4;
    let account_ptr = columns_start;
    let service_ptr = account_ptr + account_lv.len();
    let crypto_offset = service_ptr + service_lv.len();
    let record_size = crypto_offset + ssgp_blob.len();

    let mut generic_record = Vec::new();
    generic_record.extend_from_slice(&be32(record_size as u32));
    generic_record.extend_from_slice(&be32(crypto_offset as u32));
    generic_record.extend_from_slice(&be32(5));
    generic_record.extend_from_slice(&be32(0));
    generic_record.extend_from_slice(&be32(account_ptr as u32));
    generic_record.extend_from_slice(&be32(service_ptr as u32));
    generic_record.extend_from_slice(&be32(0));
    generic_record.extend_from_slice(&be32(0));
    generic_record.extend_from_slice(&be32(0));
    generic_record.extend_from_slice(&account_lv);
    generic_record.extend_from_slice(&service_lv);
    generic_record.extend_from_slice(&ssgp_blob);
    let generic_table = build_table(0x0000_0010, &generic_record);

    const SCHEMA_LEN: u32 = 4 + 4 + 3 * 4;
    let mut tables = Vec::new();
    let meta_rel = SCHEMA_LEN + tables.len() as u32;
    tables.extend_from_slice(&meta_table);
    let generic_rel = SCHEMA_LEN + tables.len() as u32;
    tables.extend_from_slice(&generic_table);
    let sym_rel = SCHEMA_LEN + tables.len() as u32;
    tables.extend_from_slice(&sym_table);

    let mut schema = Vec::new();
    schema.extend_from_slice(&be32(SCHEMA_LEN));
    schema.extend_from_slice(&be32(3));
    schema.extend_from_slice(&be32(meta_rel));
    schema.extend_from_slice(&be32(generic_rel));
    schema.extend_from_slice(&be32(sym_rel));

    let header_size = 16u32;
    let mut file = Vec::new();
    file.extend_from_slice(b"kych");
    file.extend_from_slice(&be32(1));
    file.extend_from_slice(&be32(header_size));
    file.extend_from_slice(&be32(header_size));
    file.extend_from_slice(&schema);
    file.extend_from_slice(&tables);
    file
}
