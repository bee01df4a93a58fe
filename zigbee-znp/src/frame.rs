use std::io::Read;

use crate::error::{Error, Result};

/// Start-of-frame marker.
pub const SOF: u8 = 0xFE;

/// Maximum payload size; a frame whose payload would exceed this is a
/// programming error, not a runtime condition (spec §4.A.1).
pub const MAX_PAYLOAD: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Poll = 0,
    Sreq = 1,
    Areq = 2,
    Srsp = 3,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => FrameType::Poll,
            1 => FrameType::Sreq,
            2 => FrameType::Areq,
            _ => FrameType::Srsp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Subsystem {
    RpcError = 0,
    Sys = 1,
    Mac = 2,
    Nwk = 3,
    Af = 4,
    Zdo = 5,
    Sapi = 6,
    Util = 7,
    Debug = 8,
    App = 9,
}

impl Subsystem {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & 0x1F {
            0 => Subsystem::RpcError,
            1 => Subsystem::Sys,
            2 => Subsystem::Mac,
            3 => Subsystem::Nwk,
            4 => Subsystem::Af,
            5 => Subsystem::Zdo,
            6 => Subsystem::Sapi,
            7 => Subsystem::Util,
            8 => Subsystem::Debug,
            9 => Subsystem::App,
            _ => return None,
        })
    }
}

/// The wire key that correlates a request with its response: `(Type,
/// Subsystem, ID)`. Distinct from the Go source's `FrameHeader`, which
/// includes `Type` in its equality even though requests and responses have
/// different types for the same command — callers normalize before using
/// this as a handler-map key (see `dispatcher::expected_response_header`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub subsystem: Subsystem,
    pub id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

fn fcs(len: u8, cmd0: u8, cmd1: u8, payload: &[u8]) -> u8 {
    let mut acc = len ^ cmd0 ^ cmd1;
    for &b in payload {
        acc ^= b;
    }
    acc
}

/// Wraps a byte source with one byte of pushback, so a `Garbage` result can
/// leave the byte that matched SOF in place for the next `read_frame` call —
/// mirroring the Go reader's `bufio.Reader.UnreadByte()` resync behaviour.
pub struct FrameReader<R> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushback: None,
        }
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        if let Some(b) = self.pushback.take() {
            return Ok(b);
        }
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    /// Fill `buf` completely, retrying on a transport read timeout instead
    /// of treating it as end-of-stream. A real serial transport's `read`
    /// returns `Ok(0)` or `ErrorKind::TimedOut`/`WouldBlock` when no data
    /// arrived within its configured timeout; only other I/O errors (port
    /// closed, device unplugged) are propagated.
    fn read_bytes(&mut self, mut buf: &mut [u8]) -> std::io::Result<()> {
        while !buf.is_empty() {
            match self.inner.read(buf) {
                Ok(0) => continue,
                Ok(n) => buf = &mut buf[n..],
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::Interrupted =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Scan for the next frame.
    ///
    /// Bytes preceding the SOF marker are garbage; if any were skipped, the
    /// byte that matched SOF is pushed back and `Garbage{skipped}` is
    /// returned without consuming the frame. Calling `read_frame` again
    /// immediately resumes from the pushed-back SOF byte and returns the
    /// frame itself.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut skipped = 0usize;
        loop {
            let byte = self.read_byte().map_err(zigbee_core::Error::Io)?;
            if byte == SOF {
                break;
            }
            skipped += 1;
        }
        if skipped > 0 {
            self.pushback = Some(SOF);
            return Err(Error::Garbage { skipped });
        }

        let mut len_buf = [0u8; 1];
        self.read_bytes(&mut len_buf)
            .map_err(zigbee_core::Error::Io)?;
        let len = len_buf[0];

        let mut rest = vec![0u8; 2 + len as usize + 1];
        self.read_bytes(&mut rest).map_err(zigbee_core::Error::Io)?;

        let cmd0 = rest[0];
        let cmd1 = rest[1];
        let payload = rest[2..2 + len as usize].to_vec();
        let received_fcs = rest[2 + len as usize];

        if fcs(len, cmd0, cmd1, &payload) != received_fcs {
            return Err(Error::InvalidFrame);
        }

        let frame_type = FrameType::from_bits(cmd0 >> 5);
        let subsystem = Subsystem::from_bits(cmd0 & 0x1F).ok_or(Error::InvalidFrame)?;

        Ok(Frame {
            header: FrameHeader {
                frame_type,
                subsystem,
                id: cmd1,
            },
            payload,
        })
    }
}

/// Serialize `frame` to wire bytes. Panics if the payload exceeds 250
/// bytes, matching the teacher's treatment of a too-large buffer as a
/// programming error rather than a runtime `Result`.
pub fn write_frame(frame: &Frame) -> Vec<u8> {
    assert!(
        frame.payload.len() <= MAX_PAYLOAD,
        "ZNP payload exceeds {MAX_PAYLOAD} bytes"
    );

    let len = frame.payload.len() as u8;
    let cmd0 = ((frame.header.frame_type as u8) << 5) | (frame.header.subsystem as u8);
    let cmd1 = frame.header.id;
    let checksum = fcs(len, cmd0, cmd1, &frame.payload);

    let mut out = Vec::with_capacity(5 + frame.payload.len());
    out.push(SOF);
    out.push(len);
    out.push(cmd0);
    out.push(cmd1);
    out.extend_from_slice(&frame.payload);
    out.push(checksum);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn sys_version_request_round_trips() {
        let frame = Frame {
            header: FrameHeader {
                frame_type: FrameType::Sreq,
                subsystem: Subsystem::Sys,
                id: 0x02,
            },
            payload: vec![],
        };
        let bytes = write_frame(&frame);
        assert_eq!(bytes, vec![0xFE, 0x00, 0x21, 0x02, 0x23]);

        let parsed = FrameReader::new(Cursor::new(bytes)).read_frame().unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn resyncs_past_garbage() {
        let mut reader =
            FrameReader::new(Cursor::new(vec![0x00, 0x00, 0xFE, 0x00, 0x21, 0x02, 0x23]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, Error::Garbage { skipped: 2 }));

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.header.subsystem, Subsystem::Sys);
        assert_eq!(frame.header.id, 0x02);
    }

    #[test]
    fn detects_fcs_corruption() {
        let mut reader = FrameReader::new(Cursor::new(vec![0xFE, 0x00, 0x21, 0x02, 0x22]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, Error::InvalidFrame));
    }

    #[test]
    #[should_panic]
    fn write_frame_rejects_oversized_payload() {
        let frame = Frame {
            header: FrameHeader {
                frame_type: FrameType::Areq,
                subsystem: Subsystem::Af,
                id: 0x00,
            },
            payload: vec![0u8; MAX_PAYLOAD + 1],
        };
        let _ = write_frame(&frame);
    }
}
