use std::io;
use std::time::Duration;

use log::info;

use crate::error::Error;

use super::Transport;

/// Default serial port settings. Both ZNP and ConBee dongles run at 115200
/// baud 8N1; only ZNP uses RTS/CTS hardware flow control.
const DATA_BITS: serialport::DataBits = serialport::DataBits::Eight;
const STOP_BITS: serialport::StopBits = serialport::StopBits::One;
const PARITY: serialport::Parity = serialport::Parity::None;
const BAUD_RATE: u32 = 115_200;

/// A coordinator transport backed by a native serial port.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn new(port: Box<dyn serialport::SerialPort>) -> Self {
        Self { port }
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.port, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut self.port)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut self.port, buf)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// Open a serial port with Zigbee coordinator settings (115200 8N1).
///
/// `rts_cts` enables hardware flow control, which ZNP dongles expect and
/// ConBee dongles do not use. Coordinator dongles are named explicitly by
/// the caller (`--port`); there is no USB product-string auto-detection.
pub fn open_port(port_name: &str, rts_cts: bool) -> Result<SerialTransport, Error> {
    let mut builder = serialport::new(port_name, BAUD_RATE)
        .data_bits(DATA_BITS)
        .stop_bits(STOP_BITS)
        .parity(PARITY)
        .timeout(Duration::from_millis(500));

    if rts_cts {
        builder = builder.flow_control(serialport::FlowControl::Hardware);
    }

    let port = builder.open().map_err(Error::Serial)?;

    info!("opened {port_name} at {BAUD_RATE} baud (rts_cts={rts_cts})");
    Ok(SerialTransport::new(port))
}
