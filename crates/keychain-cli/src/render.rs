//! Textual rendering of record values. The locked-record sentinel text is
//! part of the documented invocation surface.

use keychain_format::{
    AppleSharePasswordRecord, GenericPasswordRecord, InternetPasswordRecord, KeyMaterial,
    PasswordState, PrivateKeyRecord, PublicKeyRecord, X509CertificateRecord,
};

const LOCKED: &str = "[Invalid Password / Keychain Locked]";

fn field(bytes: &Option<Vec<u8>>) -> String {
    match bytes {
        Some(b) => String::from_utf8_lossy(b).into_owned(),
        None => String::new(),
    }
}

fn password_field(state: &PasswordState) -> String {
    match state {
        PasswordState::Locked => LOCKED.to_string(),
        PasswordState::Plaintext(s) => s.clone(),
        PasswordState::Base64(s) => format!("base64:{s}"),
    }
}

fn key_field(material: &KeyMaterial) -> String {
    match material {
        KeyMaterial::Locked => LOCKED.to_string(),
        KeyMaterial::Bytes(b) => {
            use base64::Engine;
            format!("base64:{}", base64::engine::general_purpose::STANDARD.encode(b))
        }
    }
}

pub fn generic_password(rec: &GenericPasswordRecord) -> String {
    format!(
        "generic_password: account={:?} service={:?} label={:?} description={:?} comment={:?} password={}",
        field(&rec.account),
        field(&rec.service),
        field(&rec.label),
        field(&rec.description),
        field(&rec.comment),
        password_field(&rec.password),
    )
}

pub fn internet_password(rec: &InternetPasswordRecord) -> String {
    format!(
        "internet_password: account={:?} server={:?} protocol={:?} port={:?} path={:?} security_domain={:?} label={:?} comment={:?} password={}",
        field(&rec.account),
        field(&rec.server),
        rec.protocol.map(|p| String::from_utf8_lossy(&p).into_owned()),
        rec.port,
        field(&rec.path),
        field(&rec.security_domain),
        field(&rec.label),
        field(&rec.comment),
        password_field(&rec.password),
    )
}

pub fn appleshare_password(rec: &AppleSharePasswordRecord) -> String {
    format!(
        "appleshare_password: account={:?} server={:?} signature={:?} address={:?} label={:?} comment={:?} password={}",
        field(&rec.account),
        field(&rec.server),
        rec.signature.map(|s| String::from_utf8_lossy(&s).into_owned()),
        rec.address.as_ref().map(|a| hex::encode(a)),
        field(&rec.label),
        field(&rec.comment),
        password_field(&rec.password),
    )
}

pub fn x509_certificate(rec: &X509CertificateRecord) -> String {
    format!(
        "x509_certificate: label={:?} der_len={}",
        field(&rec.label),
        rec.der.as_ref().map(|d| d.len()).unwrap_or(0),
    )
}

pub fn public_key(rec: &PublicKeyRecord) -> String {
    format!(
        "public_key: label={:?} data_len={}",
        field(&rec.label),
        rec.data.as_ref().map(|d| d.len()).unwrap_or(0),
    )
}

pub fn private_key(rec: &PrivateKeyRecord) -> String {
    format!(
        "private_key: label={:?} print_name={:?} key={}",
        field(&rec.label),
        field(&rec.print_name),
        key_field(&rec.key),
    )
}
