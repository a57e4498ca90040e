//! Argument surface: path, unlock secret, dump selection, and output.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "keychain-cli", about = "Forensic reader for the legacy macOS keychain format")]
pub struct Cli {
    /// Path to the keychain file to read.
    pub path: PathBuf,

    /// Unlock with a password; PBKDF2-derives the master key.
    #[arg(long)]
    pub password: Option<String>,

    /// Unlock with a password read interactively (no echo).
    #[arg(long)]
    pub password_prompt: bool,

    /// Unlock with a 48-hex-character master key, given directly.
    #[arg(long)]
    pub key: Option<String>,

    /// Unlock with a master key read interactively (no echo), as hex.
    #[arg(long)]
    pub key_prompt: bool,

    /// Unlock using the first 24 bytes of a raw master-key file.
    #[arg(long)]
    pub unlock_file: Option<PathBuf>,

    /// Dump every record kind and the password hash.
    #[arg(long)]
    pub dump_all: bool,

    /// Print the `$keychain$*salt*iv*cipher` crackable hash.
    #[arg(long)]
    pub dump_keychain_password_hash: bool,

    #[arg(long)]
    pub dump_generic_passwords: bool,

    #[arg(long)]
    pub dump_internet_passwords: bool,

    #[arg(long)]
    pub dump_appleshare_passwords: bool,

    #[arg(long)]
    pub dump_public_keys: bool,

    #[arg(long)]
    pub dump_private_keys: bool,

    #[arg(long)]
    pub dump_x509_certificates: bool,

    /// Write output to `<DIR>/output.txt` in addition to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Only log errors.
    #[arg(long)]
    pub quiet: bool,

    /// Log at debug level.
    #[arg(long)]
    pub debug: bool,
}

/// Which single unlock secret (if any) was supplied. `clap` groups can't
/// express "at most one of five, across two flag shapes and three value
/// shapes," so this is validated by hand after parsing.
pub enum UnlockSecret {
    None,
    Password(String),
    PasswordPrompt,
    KeyHex(String),
    KeyPrompt,
    UnlockFile(PathBuf),
}

impl Cli {
    pub fn unlock_secret(&self) -> Result<UnlockSecret, String> {
        let mut chosen = Vec::new();
        if let Some(p) = &self.password {
            chosen.push(UnlockSecret::Password(p.clone()));
        }
        if self.password_prompt {
            chosen.push(UnlockSecret::PasswordPrompt);
        }
        if let Some(k) = &self.key {
            chosen.push(UnlockSecret::KeyHex(k.clone()));
        }
        if self.key_prompt {
            chosen.push(UnlockSecret::KeyPrompt);
        }
        if let Some(f) = &self.unlock_file {
            chosen.push(UnlockSecret::UnlockFile(f.clone()));
        }
        match chosen.len() {
            0 => Ok(UnlockSecret::None),
            1 => Ok(chosen.into_iter().next().unwrap()),
            _ => Err("at most one of --password, --password-prompt, --key, --key-prompt, --unlock-file may be given".to_string()),
        }
    }

    /// Whether any dump flag (including `--dump-all`) was requested.
    pub fn has_any_action(&self) -> bool {
        self.dump_all
            || self.dump_keychain_password_hash
            || self.dump_generic_passwords
            || self.dump_internet_passwords
            || self.dump_appleshare_passwords
            || self.dump_public_keys
            || self.dump_private_keys
            || self.dump_x509_certificates
    }
}
