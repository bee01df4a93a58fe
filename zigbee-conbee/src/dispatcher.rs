use std::sync::mpsc::Receiver;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};
use zigbee_core::handler::{self, HandlerMap, Token};
use zigbee_core::transport::Transport;

use crate::commands::Command;
use crate::error::{Error, Result};
use crate::frame::{Frame, SlipReader, serialize_frame, slip_encode};
use crate::registry::{self, CommandId};

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
/// Go source's `Callbacks`/`ErrorHandling` pair: malformed-packet errors are
/// continuable, I/O errors end the loop.
pub type ErrorCallback = fn(&Error) -> ErrorAction;

fn default_error_callback(err: &Error) -> ErrorAction {
    match err {
        Error::InvalidPacket(_) | Error::UnknownCommandId(_) => ErrorAction::Continue,
        Error::Core(zigbee_core::Error::Io(_)) => ErrorAction::Stop,
        _ => ErrorAction::Continue,
    }
}

/// A thread-safe handle to an open ConBee port: the shared transport plus
/// the correlator the reader thread publishes into. Unlike zigbee-znp's
/// `Port`, requests and responses share a single key space (the command id)
/// since ConBee doesn't tag frames with a request/response bit.
pub struct Port {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    handlers: Arc<HandlerMap<CommandId, Command>>,
    next_sequence: AtomicU8,
}

impl Port {
    /// Open a dispatcher over `transport`, spawning its reader thread with
    /// the default error classification.
    pub fn spawn(transport: Box<dyn Transport>) -> Arc<Self> {
        Self::spawn_with_error_callback(transport, default_error_callback)
    }

    /// Open a dispatcher with a caller-supplied error classifier.
    pub fn spawn_with_error_callback(
        transport: Box<dyn Transport>,
        on_error: ErrorCallback,
    ) -> Arc<Self> {
        let port = Arc::new(Self {
            transport: Arc::new(Mutex::new(transport)),
            handlers: Arc::new(HandlerMap::new()),
            next_sequence: AtomicU8::new(0),
        });
        let transport = port.transport.clone();
        let handlers = port.handlers.clone();
        std::thread::spawn(move || run_reader(transport, handlers, on_error));
        port
    }

    /// Write `command`, register a one-shot handler for its response command
    /// id, and block for the reply.
    pub fn write_command(&self, command: Command) -> Result<Command> {
        self.write_command_timeout(command, DEFAULT_TIMEOUT)
    }

    pub fn write_command_timeout(&self, command: Command, timeout: Duration) -> Result<Command> {
        let (id, payload) = registry::encode(&command)?;

        let (token, rx) = self.handlers.register_oneshot(id).map_err(Error::Core)?;

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let frame = Frame {
            command_id: id,
            sequence,
            status: 0,
            payload,
        };
        self.write_frame(&frame)?;

        handler::recv_timeout(&self.handlers, &id, token, &rx, timeout).map_err(Error::Core)
    }

    /// Register a permanent handler for unsolicited frames carrying `id`
    /// (e.g. `ReceivedDataNotification`, `MacPollIndication`).
    pub fn register_permanent_handler(
        &self,
        id: CommandId,
    ) -> Result<(Token, Receiver<Command>)> {
        self.handlers.register_permanent(id).map_err(Error::Core)
    }

    fn write_frame(&self, frame: &Frame) -> Result<()> {
        let raw = serialize_frame(frame);
        let encoded = slip_encode(&raw);
        let mut transport = self.transport.lock().unwrap();
        transport.write_all(&encoded).map_err(zigbee_core::Error::Io)?;
        transport.flush().map_err(zigbee_core::Error::Io)?;
        Ok(())
    }
}

/// The reader loop: pull a SLIP packet off the wire, parse its ConBee frame,
/// decode its payload by command id, and deliver it to any registered
/// handler. Read- and parse-errors are classified by `on_error` (defaulting
/// to [`default_error_callback`]).
fn run_reader(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    handlers: Arc<HandlerMap<CommandId, Command>>,
    on_error: ErrorCallback,
) {
    let mut reader = SlipReader::new(SharedTransportRead(transport));
    loop {
        match reader.read_frame() {
            Ok(frame) => match registry::decode(frame.command_id, &frame.payload) {
                Ok(command) => {
                    if !handlers.fulfill(&frame.command_id, command) {
                        trace!(
                            "no handler registered for command id {:#04x}; dropping",
                            frame.command_id
                        );
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

struct SharedTransportRead(Arc<Mutex<Box<dyn Transport>>>);

impl std::io::Read for SharedTransportRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().read(buf)
    }
}
