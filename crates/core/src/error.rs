//! Error type shared by the port session and the round controller

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Port is closed")]
    NotConnected,

    #[error("Precondition failed: {0}")]
    PreconditionFailed(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Settings error: {0}")]
    Config(String),
}

impl From<serialport::Error> for PanelError {
    fn from(e: serialport::Error) -> Self {
        PanelError::Io(e.into())
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
