mod cli;
mod error;
mod render;

use std::io::Write;
use std::path::Path;

use clap::Parser;
use log::{error, info};

use cli::{Cli, UnlockSecret};
use error::CliError;
use keychain_format::Keychain;

fn main() {
    let cli = Cli::parse();
    init_logger(&cli);

    match run(&cli) {
        Ok(()) => {}
        Err(err) => {
            error!("{err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn init_logger(cli: &Cli) {
    let default_level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if !cli.has_any_action() {
        return Err(CliError::Usage("no action specified: pass at least one --dump-* flag".to_string()));
    }

    let unlock_secret = cli.unlock_secret().map_err(CliError::Usage)?;

    let mut keychain = Keychain::load(&cli.path)?;
    info!("loaded {}", cli.path.display());

    attempt_unlock(&mut keychain, unlock_secret)?;

    let output = render_dump(cli, &keychain)?;
    emit(cli, &output)
}

fn attempt_unlock(keychain: &mut Keychain, secret: UnlockSecret) -> Result<(), CliError> {
    match secret {
        UnlockSecret::None => Ok(()),
        UnlockSecret::Password(password) => Ok(keychain.unlock_password(&password)?),
        UnlockSecret::PasswordPrompt => {
            let password = rpassword::prompt_password("Keychain password: ")
                .map_err(|e| CliError::Usage(format!("failed to read password: {e}")))?;
            Ok(keychain.unlock_password(&password)?)
        }
        UnlockSecret::KeyHex(hex_key) => Ok(keychain.unlock_master_key_hex(&hex_key)?),
        UnlockSecret::KeyPrompt => {
            let hex_key = rpassword::prompt_password("Master key (hex): ")
                .map_err(|e| CliError::Usage(format!("failed to read key: {e}")))?;
            Ok(keychain.unlock_master_key_hex(&hex_key)?)
        }
        UnlockSecret::UnlockFile(path) => Ok(keychain.unlock_file(&path)?),
    }
}

fn render_dump(cli: &Cli, keychain: &Keychain) -> Result<String, CliError> {
    let mut out = String::new();
    let all = cli.dump_all;

    if all || cli.dump_keychain_password_hash {
        match keychain.password_hash() {
            Ok(hash) => out.push_str(&format!("{hash}\n")),
            Err(err) => out.push_str(&format!("keychain password hash unavailable: {err}\n")),
        }
    }
    if all || cli.dump_generic_passwords {
        for rec in keychain.generic_passwords() {
            out.push_str(&render::generic_password(&rec));
            out.push('\n');
        }
    }
    if all || cli.dump_internet_passwords {
        for rec in keychain.internet_passwords() {
            out.push_str(&render::internet_password(&rec));
            out.push('\n');
        }
    }
    if all || cli.dump_appleshare_passwords {
        for rec in keychain.appleshare_passwords() {
            out.push_str(&render::appleshare_password(&rec));
            out.push('\n');
        }
    }
    if all || cli.dump_x509_certificates {
        for rec in keychain.x509_certificates() {
            out.push_str(&render::x509_certificate(&rec));
            out.push('\n');
        }
    }
    if all || cli.dump_public_keys {
        for rec in keychain.public_keys() {
            out.push_str(&render::public_key(&rec));
            out.push('\n');
        }
    }
    if all || cli.dump_private_keys {
        for rec in keychain.private_keys() {
            out.push_str(&render::private_key(&rec));
            out.push('\n');
        }
    }
    Ok(out)
}

fn emit(cli: &Cli, output: &str) -> Result<(), CliError> {
    print!("{output}");

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir).map_err(CliError::OutputDir)?;
        let log_path: &Path = &dir.join("output.txt");
        let mut file = std::fs::File::create(log_path).map_err(CliError::OutputDir)?;
        file.write_all(output.as_bytes()).map_err(CliError::OutputDir)?;
    }
    Ok(())
}
