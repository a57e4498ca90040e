/// Error taxonomy for the crypto core.
///
/// Both variants are recoverable from the caller's point of view: a failure
/// here downgrades the affected record (or, for [`CryptoError::UnlockFailed`],
/// the whole keychain instance) to a locked state rather than aborting.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("PBKDF2/unwrap yielded invalid padding or a short plaintext")]
    UnlockFailed,
    #[error("per-record unwrap or SSGP decrypt failed")]
    DecryptFailed,
}
