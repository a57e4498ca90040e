/// Error taxonomy for the container parser.
///
/// Only [`ContainerError::Malformed`] on the root header and
/// [`ContainerError::Io`] are fatal at load; everything else downgrades a
/// single table or record to empty/locked.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("malformed container: {0}")]
    Malformed(&'static str),

    #[error("table kind has no table in this file")]
    TableAbsent,

    #[error("unlock failed: {0}")]
    Unlock(#[from] keychain_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
