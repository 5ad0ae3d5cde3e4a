//! Client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(#[from] lw2_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] lw2_transport::TransportError),
}
