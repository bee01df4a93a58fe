use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] zigbee_core::Error),

    #[error("{skipped} byte(s) of garbage before start of frame")]
    Garbage { skipped: usize },

    #[error("frame FCS mismatch")]
    InvalidFrame,

    #[error("payload exceeds 250 bytes")]
    PayloadTooLarge,

    #[error("command bytes did not satisfy the declared field schema")]
    InvalidData,

    #[error("no command registered for wire header {0:?}")]
    UnknownWireHeader(crate::frame::FrameHeader),

    #[error("bring-up failed: device did not report coordinator state")]
    BringUpFailed,

    #[error("address mode unsupported for AfDataRequest")]
    UnsupportedAddressMode,
}
