//! Hand-coded per-command encode/decode helpers. ConBee's wire format mixes
//! inline lengths, reserved pad bytes, and conditional fields a reflective
//! codec cannot express (e.g. the destination-endpoint byte is suppressed
//! when address mode is Group), so each command owns its own
//! `parse_payload`/`serialize_payload` pair built from these primitives.

use zigbee_core::address::{Address, AddressMode, ExtendedAddress};

use crate::error::{Error, Result};

/// Reserve two bytes for a nested length-prefixed region and return the
/// index to backfill once the region's contents are known.
pub fn begin_payload(buf: &mut Vec<u8>) -> usize {
    let mark = buf.len();
    buf.extend_from_slice(&[0, 0]);
    mark
}

/// Backfill the 2-byte little-endian length of the region that began at
/// `mark`, covering every byte written since.
pub fn end_payload(buf: &mut Vec<u8>, mark: usize) {
    let len = (buf.len() - mark - 2) as u16;
    buf[mark..mark + 2].copy_from_slice(&len.to_le_bytes());
}

pub fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Read helpers operate on a cursor-style `(buf, offset)` pair so a command
/// parser can sequence several in a row.
pub fn read_u8(buf: &[u8], offset: &mut usize) -> Result<u8> {
    let b = *buf
        .get(*offset)
        .ok_or(Error::InvalidPacket("buffer exhausted reading u8"))?;
    *offset += 1;
    Ok(b)
}

pub fn read_u16(buf: &[u8], offset: &mut usize) -> Result<u16> {
    let end = *offset + 2;
    let bytes: [u8; 2] = buf
        .get(*offset..end)
        .ok_or(Error::InvalidPacket("buffer exhausted reading u16"))?
        .try_into()
        .unwrap();
    *offset = end;
    Ok(u16::from_le_bytes(bytes))
}

pub fn read_u32(buf: &[u8], offset: &mut usize) -> Result<u32> {
    let end = *offset + 4;
    let bytes: [u8; 4] = buf
        .get(*offset..end)
        .ok_or(Error::InvalidPacket("buffer exhausted reading u32"))?
        .try_into()
        .unwrap();
    *offset = end;
    Ok(u32::from_le_bytes(bytes))
}

pub fn read_u64(buf: &[u8], offset: &mut usize) -> Result<u64> {
    let end = *offset + 8;
    let bytes: [u8; 8] = buf
        .get(*offset..end)
        .ok_or(Error::InvalidPacket("buffer exhausted reading u64"))?
        .try_into()
        .unwrap();
    *offset = end;
    Ok(u64::from_le_bytes(bytes))
}

pub fn read_bytes<'a>(buf: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = *offset + len;
    let slice = buf
        .get(*offset..end)
        .ok_or(Error::InvalidPacket("buffer exhausted reading bytes"))?;
    *offset = end;
    Ok(slice)
}

/// Read a mode-byte-prefixed [`Address`].
pub fn read_address(buf: &[u8], offset: &mut usize) -> Result<Address> {
    let mode_byte = read_u8(buf, offset)?;
    let mode = AddressMode::from_byte(mode_byte)
        .ok_or(Error::InvalidPacket("unrecognized address mode byte"))?;

    Ok(match mode {
        AddressMode::None => Address::None,
        AddressMode::Group => Address::Group(read_u16(buf, offset)?),
        AddressMode::Nwk => Address::Nwk(read_u16(buf, offset)?),
        AddressMode::Ieee => Address::Ieee(ExtendedAddress(read_u64(buf, offset)?)),
        AddressMode::Combined => {
            let short = read_u16(buf, offset)?;
            let extended = ExtendedAddress(read_u64(buf, offset)?);
            Address::Combined { short, extended }
        }
    })
}

/// Write a mode-byte-prefixed [`Address`].
pub fn write_address(buf: &mut Vec<u8>, addr: &Address) {
    write_u8(buf, addr.mode() as u8);
    match *addr {
        Address::None => {}
        Address::Group(s) | Address::Nwk(s) => write_u16(buf, s),
        Address::Ieee(e) => write_u64(buf, e.0),
        Address::Combined { short, extended } => {
            write_u16(buf, short);
            write_u64(buf, extended.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_end_payload_backfills_length() {
        let mut buf = vec![0xAA];
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, 1);
        write_u16(&mut buf, 2);
        end_payload(&mut buf, mark);
        assert_eq!(buf[mark..mark + 2], 3u16.to_le_bytes());
    }

    #[test]
    fn address_round_trips_each_mode() {
        for addr in [
            Address::None,
            Address::Group(0x1234),
            Address::Nwk(0x5678),
            Address::Ieee(ExtendedAddress(0x0011223344556677)),
            Address::Combined {
                short: 0xABCD,
                extended: ExtendedAddress(0x1122334455667788),
            },
        ] {
            let mut buf = Vec::new();
            write_address(&mut buf, &addr);
            let mut offset = 0;
            assert_eq!(read_address(&buf, &mut offset).unwrap(), addr);
            assert_eq!(offset, buf.len());
        }
    }
}
