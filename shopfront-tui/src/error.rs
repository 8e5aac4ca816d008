//! Error types for the TUI.

use crate::config::ConfigError;
use shopfront_client::session::CredentialError;
use shopfront_client::transport::TransportInitError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error(transparent)]
    Transport(#[from] TransportInitError),
}
