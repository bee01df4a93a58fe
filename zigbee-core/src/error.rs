use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by every coordinator family.
///
/// Byte- and codec-level framing errors are family-specific (each of
/// zigbee-znp and zigbee-conbee defines its own `Garbage`/`InvalidFrame`/
/// `InvalidPacket`-shaped variants, since the two wire formats fail in
/// different ways) and are routed through the reader loop's error callbacks
/// rather than through this shared type. `Timeout`, `Transport`, `NotFound`
/// and `Unsupported` are returned to callers.
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timeout waiting for response")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("port closed")]
    Closed,

    #[error("controller not found: {0}")]
    NotFound(String),

    #[error("unsupported address mode")]
    Unsupported,

    #[error("a handler is already registered for this wire key")]
    HandlerConflict,
}
