//! ConBee doesn't distinguish request/response by a frame-type bit the way
//! ZNP does: both directions share the same command id, and which struct a
//! payload decodes into depends on whether the host wrote it or the device
//! did. So unlike zigbee-znp's single keyed table, this registry keeps two:
//! one for encoding commands the host sends, one for decoding frames the
//! device sends back.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::commands::{
    Command, DeviceStateRequest, DeviceStateResponse, EnqueueSendDataRequest,
    EnqueueSendDataResponse, MacPollIndication, QuerySendDataResponse,
    ReadFirmwareVersionRequest, ReadFirmwareVersionResponse, ReadParameterRequest,
    ReadParameterResponse, ReadReceivedDataResponse, ReceivedDataNotification,
    UpdateNeighborCommand, WriteParameterRequest, WriteParameterResponse,
};
use crate::error::{Error, Result};

pub type CommandId = u8;

pub const READ_FIRMWARE_VERSION: CommandId = 0x0D;
pub const READ_PARAMETER: CommandId = 0x0A;
pub const WRITE_PARAMETER: CommandId = 0x0B;
pub const DEVICE_STATE: CommandId = 0x07;
pub const RECEIVED_DATA_NOTIFICATION: CommandId = 0x0E;
pub const READ_RECEIVED_DATA: CommandId = 0x17;
pub const MAC_POLL_INDICATION: CommandId = 0x1C;
pub const ENQUEUE_SEND_DATA: CommandId = 0x12;
pub const QUERY_SEND_DATA: CommandId = 0x04;
pub const UPDATE_NEIGHBOR: CommandId = 0x1D;

type DecodeFn = fn(&[u8]) -> Result<Command>;
type EncodeFn = fn(&Command) -> Option<Vec<u8>>;

struct DecodeEntry {
    id: CommandId,
    decode: DecodeFn,
}

struct EncodeEntry {
    id: CommandId,
    encode: EncodeFn,
}

fn decode_entries() -> &'static [DecodeEntry] {
    macro_rules! entry {
        ($ty:ident, $id:expr) => {
            DecodeEntry {
                id: $id,
                decode: |buf| $ty::parse(buf).map(Command::$ty),
            }
        };
    }

    static ENTRIES: OnceLock<Vec<DecodeEntry>> = OnceLock::new();
    ENTRIES.get_or_init(|| {
        vec![
            entry!(ReadFirmwareVersionResponse, READ_FIRMWARE_VERSION),
            entry!(ReadParameterResponse, READ_PARAMETER),
            entry!(WriteParameterResponse, WRITE_PARAMETER),
            entry!(DeviceStateResponse, DEVICE_STATE),
            entry!(ReceivedDataNotification, RECEIVED_DATA_NOTIFICATION),
            entry!(ReadReceivedDataResponse, READ_RECEIVED_DATA),
            entry!(MacPollIndication, MAC_POLL_INDICATION),
            entry!(EnqueueSendDataResponse, ENQUEUE_SEND_DATA),
            entry!(QuerySendDataResponse, QUERY_SEND_DATA),
            entry!(UpdateNeighborCommand, UPDATE_NEIGHBOR),
        ]
    })
}

fn encode_entries() -> &'static [EncodeEntry] {
    macro_rules! entry {
        ($ty:ident, $id:expr) => {
            EncodeEntry {
                id: $id,
                encode: |cmd| match cmd {
                    Command::$ty(inner) => Some(inner.serialize()),
                    _ => None,
                },
            }
        };
    }

    static ENTRIES: OnceLock<Vec<EncodeEntry>> = OnceLock::new();
    ENTRIES.get_or_init(|| {
        vec![
            entry!(ReadFirmwareVersionRequest, READ_FIRMWARE_VERSION),
            entry!(ReadParameterRequest, READ_PARAMETER),
            entry!(WriteParameterRequest, WRITE_PARAMETER),
            entry!(DeviceStateRequest, DEVICE_STATE),
            entry!(EnqueueSendDataRequest, ENQUEUE_SEND_DATA),
            entry!(UpdateNeighborCommand, UPDATE_NEIGHBOR),
        ]
    })
}

fn decode_index() -> &'static HashMap<CommandId, usize> {
    static INDEX: OnceLock<HashMap<CommandId, usize>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for (i, entry) in decode_entries().iter().enumerate() {
            if map.insert(entry.id, i).is_some() {
                panic!("duplicate ConBee incoming command id registered: {:#04x}", entry.id);
            }
        }
        map
    })
}

/// Decode a frame payload received from the device, given its command id.
pub fn decode(command_id: CommandId, payload: &[u8]) -> Result<Command> {
    let idx = *decode_index()
        .get(&command_id)
        .ok_or(Error::UnknownCommandId(command_id))?;
    (decode_entries()[idx].decode)(payload)
}

/// Encode a command the host is sending, returning its wire command id.
pub fn encode(command: &Command) -> Result<(CommandId, Vec<u8>)> {
    for entry in encode_entries() {
        if let Some(bytes) = (entry.encode)(command) {
            return Ok((entry.id, bytes));
        }
    }
    Err(Error::InvalidPacket("no outgoing encoding for this command"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_read_firmware_version() {
        let cmd = Command::ReadFirmwareVersionRequest(ReadFirmwareVersionRequest {
            reserved: crate::commands::FIRMWARE_VERSION_REQUEST_RESERVED,
        });
        let (id, bytes) = encode(&cmd).unwrap();
        assert_eq!(id, READ_FIRMWARE_VERSION);

        let response_bytes = {
            let mut buf = Vec::new();
            crate::codec::write_u32(&mut buf, 0x26720700);
            buf
        };
        let decoded = decode(id, &response_bytes).unwrap();
        assert!(matches!(decoded, Command::ReadFirmwareVersionResponse(_)));
        let _ = bytes;
    }

    #[test]
    fn unknown_command_id_is_rejected() {
        assert!(matches!(
            decode(0xFF, &[]),
            Err(Error::UnknownCommandId(0xFF))
        ));
    }
}
