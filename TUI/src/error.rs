//! Error types for the local side of drape.
//!
//! Remote failures have their own type ([`crate::backend::RemoteServiceError`]);
//! this covers configuration, file access and image loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be parsed or holds invalid values
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Selected file is not a usable image
    #[error("Image error: {0}")]
    Media(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, Error>;
