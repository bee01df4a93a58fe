use std::io::Read;

use crate::error::{Error, Result};

const END: u8 = 0xC0;
const ESC: u8 = 0xDB;
const ESC_END: u8 = 0xDC;
const ESC_ESC: u8 = 0xDD;

/// SLIP-encode `data`, wrapping it in a single `END`-delimited packet
/// (RFC 1055).
pub fn slip_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 2);
    out.push(END);
    for &b in data {
        match b {
            END => {
                out.push(ESC);
                out.push(ESC_END);
            }
            ESC => {
                out.push(ESC);
                out.push(ESC_ESC);
            }
            _ => out.push(b),
        }
    }
    out.push(END);
    out
}

/// Reverse [`slip_encode`]'s escaping on an already-delimited payload (no
/// leading/trailing `END` bytes).
fn slip_unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().copied();
    while let Some(b) = iter.next() {
        if b == ESC {
            match iter.next() {
                Some(ESC_END) => out.push(END),
                Some(ESC_ESC) => out.push(ESC),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(b);
        }
    }
    out
}

/// Sum-based checksum: chosen so that the sum of all preceding bytes plus
/// the checksum itself is congruent to 0 mod 2^16.
pub fn checksum(data: &[u8]) -> u16 {
    let sum: u32 = data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
    let crc = (!(sum & 0xFFFF)).wrapping_add(1) & 0xFFFF;
    crc as u16
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command_id: u8,
    pub sequence: u8,
    pub status: u8,
    pub payload: Vec<u8>,
}

/// Serialize `frame` to raw (pre-SLIP) bytes: header, payload, checksum.
pub fn serialize_frame(frame: &Frame) -> Vec<u8> {
    let frame_len = (5 + frame.payload.len()) as u16;
    let mut body = Vec::with_capacity(frame_len as usize);
    body.push(frame.command_id);
    body.push(frame.sequence);
    body.push(frame.status);
    body.extend_from_slice(&frame_len.to_le_bytes());
    body.extend_from_slice(&frame.payload);

    let crc = checksum(&body);
    body.extend_from_slice(&crc.to_le_bytes());
    body
}

/// Parse raw (already SLIP-unescaped) bytes into a [`Frame`], checking the
/// declared length and checksum.
pub fn parse_frame(raw: &[u8]) -> Result<Frame> {
    if raw.len() < 7 {
        return Err(Error::InvalidPacket("frame shorter than header+checksum"));
    }

    let command_id = raw[0];
    let sequence = raw[1];
    let status = raw[2];
    let frame_len = u16::from_le_bytes([raw[3], raw[4]]) as usize;

    if frame_len != raw.len() - 2 {
        return Err(Error::InvalidPacket("declared length mismatch"));
    }

    let body = &raw[..raw.len() - 2];
    let received_crc = u16::from_le_bytes([raw[raw.len() - 2], raw[raw.len() - 1]]);
    if checksum(body) != received_crc {
        return Err(Error::InvalidPacket("checksum mismatch"));
    }

    Ok(Frame {
        command_id,
        sequence,
        status,
        payload: raw[5..raw.len() - 2].to_vec(),
    })
}

/// Reads SLIP packets off a byte stream and parses each into a [`Frame`].
pub struct SlipReader<R> {
    inner: R,
}

impl<R: Read> SlipReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => continue,
                Ok(_) => return Ok(buf[0]),
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
    }

    /// Block until a full SLIP packet has been read, then parse it.
    pub fn read_frame(&mut self) -> Result<Frame> {
        // Skip any idle END bytes between packets.
        let mut raw = Vec::new();
        loop {
            let b = self.read_byte().map_err(zigbee_core::Error::Io)?;
            if b == END {
                if raw.is_empty() {
                    continue;
                }
                break;
            }
            raw.push(b);
        }
        let unescaped = slip_unescape(&raw);
        parse_frame(&unescaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_firmware_version_request_round_trips() {
        let frame = Frame {
            command_id: 0x0D,
            sequence: 0x01,
            status: 0x00,
            payload: vec![0x00, 0x00, 0xEE, 0x02],
        };
        let raw = serialize_frame(&frame);
        assert_eq!(
            raw,
            vec![0x0D, 0x01, 0x00, 0x09, 0x00, 0x00, 0x00, 0xEE, 0x02, 0xF9, 0xFE]
        );

        let encoded = slip_encode(&raw);
        assert_eq!(encoded.first(), Some(&END));
        assert_eq!(encoded.last(), Some(&END));

        let mut reader = SlipReader::new(Cursor::new(encoded));
        let parsed = reader.read_frame().unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn escapes_end_and_esc_bytes() {
        let raw = vec![END, ESC, 0x01];
        let encoded = slip_encode(&raw);
        // first/last are packet delimiters; interior bytes are escaped.
        assert_eq!(&encoded[1..encoded.len() - 1], &[ESC, ESC_END, ESC, ESC_ESC, 0x01]);
        assert_eq!(slip_unescape(&encoded[1..encoded.len() - 1]), raw);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let frame = Frame {
            command_id: 0x0D,
            sequence: 0x01,
            status: 0x00,
            payload: vec![],
        };
        let mut raw = serialize_frame(&frame);
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        assert!(matches!(parse_frame(&raw), Err(Error::InvalidPacket(_))));
    }

    #[test]
    fn rejects_declared_length_mismatch() {
        let mut raw = serialize_frame(&Frame {
            command_id: 0x0D,
            sequence: 0x01,
            status: 0x00,
            payload: vec![0xAA],
        });
        raw[3] = 0xFF;
        assert!(matches!(parse_frame(&raw), Err(Error::InvalidPacket(_))));
    }
}
