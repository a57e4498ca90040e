/// Top-level CLI error, wrapping both library error types into one exit path.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Container(#[from] keychain_format::ContainerError),

    #[error("failed to create output directory: {0}")]
    OutputDir(std::io::Error),
}

impl CliError {
    /// Every failure here exits 1; there is no distinct code per error kind.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
