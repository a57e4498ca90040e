//! Read-only parser for the legacy macOS keychain (Apple DB) container format.
//!
//! [`Keychain::load`] parses the container structure eagerly; unlocking and
//! record decoding are driven by the caller through the methods on
//! [`Keychain`].

mod column;
mod dbblob;
mod error;
mod header;
mod keyblob;
mod keychain;
mod records;
mod table_index;
mod view;

pub use error::{ContainerError, Result};
pub use keychain::{Keychain, LockState};
pub use records::{
    AppleSharePasswordRecord, GenericPasswordRecord, InternetPasswordRecord, KeyMaterial,
    PasswordState, PrivateKeyRecord, PublicKeyRecord, RecordValue, X509CertificateRecord,
};
pub use table_index::TableKind;
