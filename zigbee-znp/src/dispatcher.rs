use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};
use zigbee_core::handler::{self, HandlerMap, Token};
use zigbee_core::transport::Transport;

use crate::commands::Command;
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameHeader, FrameReader};
use crate::registry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// What a reader-loop error callback decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Unreachable by the default classifier; lets a caller-supplied
    /// callback treat a condition as a programmer error.
    Panic,
    /// Stop the reader thread; no further frames will be delivered.
    Stop,
    /// Log and keep reading.
    Continue,
}

/// Classifies a reader-loop error into an [`ErrorAction`]. Grounded on the
/// Go source's `Callbacks`/`ErrorHandling` pair: byte- and codec-level
/// errors are continuable, I/O errors end the loop.
pub type ErrorCallback = fn(&Error) -> ErrorAction;

fn default_error_callback(err: &Error) -> ErrorAction {
    match err {
        Error::Garbage { .. } | Error::InvalidFrame | Error::UnknownWireHeader(_) => {
            ErrorAction::Continue
        }
        Error::Core(zigbee_core::Error::Io(_)) => ErrorAction::Stop,
        _ => ErrorAction::Continue,
    }
}

/// A thread-safe handle to an open ZNP port: the shared transport plus the
/// correlator the reader thread publishes into.
///
/// Grounded on the Go source's `Port`, which pairs a serial connection with
/// a mutex-protected `handlers` map and a single reader goroutine. Reads and
/// writes share one `Transport` behind a mutex rather than two handles to
/// the same file descriptor: each blocking read holds the lock only for the
/// duration of one `read()` call (bounded by the transport's read timeout),
/// so a pending write is never starved for long.
pub struct Port {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    handlers: Arc<HandlerMap<FrameHeader, Command>>,
}

impl Port {
    /// Open a dispatcher over `transport`, spawning its reader thread with
    /// the default error classification.
    pub fn spawn(transport: Box<dyn Transport>) -> Arc<Self> {
        Self::spawn_with_error_callback(transport, default_error_callback)
    }

    /// Open a dispatcher with a caller-supplied error classifier, e.g. to
    /// treat an otherwise-continuable condition as fatal in a test.
    pub fn spawn_with_error_callback(
        transport: Box<dyn Transport>,
        on_error: ErrorCallback,
    ) -> Arc<Self> {
        let port = Arc::new(Self {
            transport: Arc::new(Mutex::new(transport)),
            handlers: Arc::new(HandlerMap::new()),
        });
        let transport = port.transport.clone();
        let handlers = port.handlers.clone();
        std::thread::spawn(move || run_reader(transport, handlers, on_error));
        port
    }

    /// Send `command` and, if it is a synchronous request (SREQ), block for
    /// its SRSP with the default timeout.
    pub fn write_command(&self, command: Command) -> Result<Option<Command>> {
        self.write_command_timeout(command, DEFAULT_TIMEOUT)
    }

    pub fn write_command_timeout(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<Option<Command>> {
        let (header, payload) = registry::encode(&command);
        let is_sreq = header.frame_type == crate::frame::FrameType::Sreq;

        let waiter = if is_sreq {
            let response_header = registry::expected_response_header(header);
            let (token, rx) = self
                .handlers
                .register_oneshot(response_header)
                .map_err(Error::Core)?;
            Some((response_header, token, rx))
        } else {
            None
        };

        let bytes = crate::frame::write_frame(&Frame { header, payload });
        {
            let mut transport = self.transport.lock().unwrap();
            transport.write_all(&bytes).map_err(zigbee_core::Error::Io)?;
            transport.flush().map_err(zigbee_core::Error::Io)?;
        }

        match waiter {
            None => Ok(None),
            Some((response_header, token, rx)) => {
                let value = handler::recv_timeout(
                    &self.handlers,
                    &response_header,
                    token,
                    &rx,
                    timeout,
                )
                .map_err(Error::Core)?;
                Ok(Some(value))
            }
        }
    }

    /// Register a permanent handler for unsolicited indications matching
    /// `header` (e.g. `AfIncomingMsg`).
    pub fn register_permanent_handler(
        &self,
        header: FrameHeader,
    ) -> Result<(Token, Receiver<Command>)> {
        self.handlers
            .register_permanent(header)
            .map_err(Error::Core)
    }

    /// Write the single 0xEF "magic byte" that makes the serial bootloader
    /// skip its 60-second wait and jump directly into the ZNP application
    /// image. Unframed, and has no response to correlate.
    pub fn write_raw_magic_byte(&self) -> Result<()> {
        let mut transport = self.transport.lock().unwrap();
        transport
            .write_all(&[0xEF])
            .map_err(zigbee_core::Error::Io)?;
        transport.flush().map_err(zigbee_core::Error::Io)?;
        Ok(())
    }
}

/// The reader loop: read a frame, parse it, and deliver it to any
/// registered handler. Read- and parse-errors are classified by `on_error`
/// (defaulting to [`default_error_callback`]) and logged at a severity
/// matching the teacher's `radio` reader (`trace!`/`debug!`/`warn!`).
fn run_reader(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    handlers: Arc<HandlerMap<FrameHeader, Command>>,
    on_error: ErrorCallback,
) {
    let mut reader = FrameReader::new(SharedTransportRead(transport));
    loop {
        match reader.read_frame() {
            Ok(frame) => match registry::decode(frame.header, &frame.payload) {
                Ok(command) => {
                    if !handlers.fulfill(&frame.header, command) {
                        trace!("no handler registered for {:?}; dropping", frame.header);
                    }
                }
                Err(err) => match on_error(&err) {
                    ErrorAction::Continue => debug!("failed to decode frame payload: {err}"),
                    ErrorAction::Stop => {
                        warn!("reader stopping on decode error: {err}");
                        return;
                    }
                    ErrorAction::Panic => panic!("reader callback demanded panic on: {err}"),
                },
            },
            Err(err) => match on_error(&err) {
                ErrorAction::Continue => debug!("continuing past read error: {err}"),
                ErrorAction::Stop => {
                    warn!("reader stopping: {err}");
                    return;
                }
                ErrorAction::Panic => panic!("reader callback demanded panic on: {err}"),
            },
        }
    }
}

/// Adapts the mutex-shared transport to `std::io::Read` for `FrameReader`,
/// locking only for the duration of each individual read.
struct SharedTransportRead(Arc<Mutex<Box<dyn Transport>>>);

impl std::io::Read for SharedTransportRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().read(buf)
    }
}
