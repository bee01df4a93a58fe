use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] zigbee_core::Error),

    #[error("invalid packet: {0}")]
    InvalidPacket(&'static str),

    #[error("no command registered for command id {0:#04x}")]
    UnknownCommandId(u8),

    #[error("address mode unsupported for this command")]
    UnsupportedAddressMode,

    #[error("bring-up failed")]
    BringUpFailed,
}
