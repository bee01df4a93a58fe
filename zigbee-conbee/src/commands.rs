use zigbee_core::address::Address;

use crate::codec::{
    begin_payload, end_payload, read_address, read_bytes, read_u16, read_u32, read_u64, read_u8,
    write_address, write_u16, write_u32, write_u64, write_u8,
};
use crate::error::Result;

/// Trailing byte `SerializeFrame` appends after every `UpdateNeighborCommand`
/// payload. Undocumented in the original source; preserved here as a named
/// constant rather than a bare literal per the resolved open question.
pub const UPDATE_NEIGHBOR_TRAILER: u8 = 0x80;

/// Magic constant ConBee firmware expects in the reserved field of a
/// `ReadFirmwareVersionRequest`.
pub const FIRMWARE_VERSION_REQUEST_RESERVED: u32 = 0x02EE_0000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadFirmwareVersionRequest {
    pub reserved: u32,
}

impl ReadFirmwareVersionRequest {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        Ok(Self {
            reserved: read_u32(payload, &mut offset)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u32(&mut buf, self.reserved);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadFirmwareVersionResponse {
    pub version: u32,
}

impl ReadFirmwareVersionResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        Ok(Self {
            version: read_u32(payload, &mut offset)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u32(&mut buf, self.version);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadParameterRequest {
    pub parameter_id: u8,
}

impl ReadParameterRequest {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let _len = read_u16(payload, &mut offset)?;
        Ok(Self {
            parameter_id: read_u8(payload, &mut offset)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.parameter_id);
        end_payload(&mut buf, mark);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadParameterResponse {
    pub parameter_id: u8,
    pub value: Vec<u8>,
}

impl ReadParameterResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let len = read_u16(payload, &mut offset)? as usize;
        let parameter_id = read_u8(payload, &mut offset)?;
        let value_len = len.saturating_sub(1);
        let value = read_bytes(payload, &mut offset, value_len)?.to_vec();
        Ok(Self {
            parameter_id,
            value,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.parameter_id);
        buf.extend_from_slice(&self.value);
        end_payload(&mut buf, mark);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteParameterRequest {
    pub parameter_id: u8,
    pub value: Vec<u8>,
}

impl WriteParameterRequest {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let len = read_u16(payload, &mut offset)? as usize;
        let parameter_id = read_u8(payload, &mut offset)?;
        let value = read_bytes(payload, &mut offset, len.saturating_sub(1))?.to_vec();
        Ok(Self {
            parameter_id,
            value,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.parameter_id);
        buf.extend_from_slice(&self.value);
        end_payload(&mut buf, mark);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteParameterResponse {
    pub parameter_id: u8,
}

impl WriteParameterResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let _len = read_u16(payload, &mut offset)?;
        Ok(Self {
            parameter_id: read_u8(payload, &mut offset)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.parameter_id);
        end_payload(&mut buf, mark);
        buf
    }
}

/// `DeviceStateRequest`/`DeviceStateResponse` and
/// `ReceivedDataNotification` share the same reserved-byte layout: one
/// device-state byte followed by two reserved bytes. The original source's
/// inconsistent reserved-byte counts between parse and serialize are
/// resolved here per the deCONZ-Serial-Protocol reference: both directions
/// use the same 3-byte shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceStateRequest;

impl DeviceStateRequest {
    pub fn parse(_payload: &[u8]) -> Result<Self> {
        Ok(Self)
    }

    pub fn serialize(&self) -> Vec<u8> {
        vec![0, 0, 0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceStateResponse {
    pub device_state: u8,
}

impl DeviceStateResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let device_state = read_u8(payload, &mut offset)?;
        Ok(Self { device_state })
    }

    pub fn serialize(&self) -> Vec<u8> {
        vec![self.device_state, 0, 0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceivedDataNotification {
    pub device_state: u8,
}

impl ReceivedDataNotification {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        Ok(Self {
            device_state: read_u8(payload, &mut offset)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        vec![self.device_state, 0, 0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadReceivedDataRequest;

impl ReadReceivedDataRequest {
    pub fn parse(_payload: &[u8]) -> Result<Self> {
        Ok(Self)
    }

    pub fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// The full APS data indication: device/network state, source and
/// destination addressing, profile/cluster identifiers, the application
/// payload, and a trailing fixed-size region carrying link quality and RSSI
/// (`link_quality` at offset+2, `rssi` at offset+7 of that region).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadReceivedDataResponse {
    pub device_state: u8,
    pub destination: Address,
    pub destination_endpoint: u8,
    pub source: Address,
    pub source_endpoint: u8,
    pub profile_id: u16,
    pub cluster_id: u16,
    pub data: Vec<u8>,
    pub link_quality: u8,
    pub rssi: i8,
}

impl ReadReceivedDataResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let _payload_len = read_u16(payload, &mut offset)?;
        let device_state = read_u8(payload, &mut offset)?;
        let destination = read_address(payload, &mut offset)?;
        let destination_endpoint = read_u8(payload, &mut offset)?;
        let source = read_address(payload, &mut offset)?;
        let source_endpoint = read_u8(payload, &mut offset)?;
        let profile_id = read_u16(payload, &mut offset)?;
        let cluster_id = read_u16(payload, &mut offset)?;

        let data_len = read_u16(payload, &mut offset)? as usize;
        let data = read_bytes(payload, &mut offset, data_len)?.to_vec();

        let trailer = read_bytes(payload, &mut offset, 8)?;
        let link_quality = trailer[2];
        let rssi = trailer[7] as i8;

        Ok(Self {
            device_state,
            destination,
            destination_endpoint,
            source,
            source_endpoint,
            profile_id,
            cluster_id,
            data,
            link_quality,
            rssi,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.device_state);
        write_address(&mut buf, &self.destination);
        write_u8(&mut buf, self.destination_endpoint);
        write_address(&mut buf, &self.source);
        write_u8(&mut buf, self.source_endpoint);
        write_u16(&mut buf, self.profile_id);
        write_u16(&mut buf, self.cluster_id);
        write_u16(&mut buf, self.data.len() as u16);
        buf.extend_from_slice(&self.data);
        let mut trailer = [0u8; 8];
        trailer[2] = self.link_quality;
        trailer[7] = self.rssi as u8;
        buf.extend_from_slice(&trailer);
        end_payload(&mut buf, mark);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MacPollIndication {
    pub source: Address,
    pub link_quality: u8,
}

impl MacPollIndication {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let source = read_address(payload, &mut offset)?;
        let link_quality = read_u8(payload, &mut offset)?;
        Ok(Self {
            source,
            link_quality,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnqueueSendDataRequest {
    pub request_id: u8,
    pub flags: u8,
    pub destination: Address,
    pub destination_endpoint: u8,
    pub profile_id: u16,
    pub cluster_id: u16,
    pub source_endpoint: u8,
    pub data: Vec<u8>,
    pub radius: u8,
}

impl EnqueueSendDataRequest {
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mark = begin_payload(&mut buf);
        write_u8(&mut buf, self.request_id);
        write_u8(&mut buf, self.flags);
        write_address(&mut buf, &self.destination);
        if !matches!(self.destination, Address::Group(_)) {
            write_u8(&mut buf, self.destination_endpoint);
        }
        write_u16(&mut buf, self.profile_id);
        write_u16(&mut buf, self.cluster_id);
        write_u8(&mut buf, self.source_endpoint);
        write_u16(&mut buf, self.data.len() as u16);
        buf.extend_from_slice(&self.data);
        write_u8(&mut buf, self.radius);
        if self.flags != 0 {
            buf.extend_from_slice(&[0u8; 5]);
        }
        end_payload(&mut buf, mark);
        buf
    }

    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let _len = read_u16(payload, &mut offset)?;
        let request_id = read_u8(payload, &mut offset)?;
        let flags = read_u8(payload, &mut offset)?;
        let destination = read_address(payload, &mut offset)?;
        let destination_endpoint = if matches!(destination, Address::Group(_)) {
            0
        } else {
            read_u8(payload, &mut offset)?
        };
        let profile_id = read_u16(payload, &mut offset)?;
        let cluster_id = read_u16(payload, &mut offset)?;
        let source_endpoint = read_u8(payload, &mut offset)?;
        let data_len = read_u16(payload, &mut offset)? as usize;
        let data = read_bytes(payload, &mut offset, data_len)?.to_vec();
        let radius = read_u8(payload, &mut offset)?;
        if flags != 0 {
            let _ = read_bytes(payload, &mut offset, 5)?;
        }
        Ok(Self {
            request_id,
            flags,
            destination,
            destination_endpoint,
            profile_id,
            cluster_id,
            source_endpoint,
            data,
            radius,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnqueueSendDataResponse {
    pub request_id: u8,
}

impl EnqueueSendDataResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let _len = read_u16(payload, &mut offset)?;
        Ok(Self {
            request_id: read_u8(payload, &mut offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySendDataRequest;

impl QuerySendDataRequest {
    pub fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySendDataResponse {
    pub request_id: u8,
    pub destination: Address,
    pub destination_endpoint: u8,
    pub source_endpoint: u8,
    pub confirm_status: u8,
}

impl QuerySendDataResponse {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let request_id = read_u8(payload, &mut offset)?;
        let destination = read_address(payload, &mut offset)?;
        let destination_endpoint = read_u8(payload, &mut offset)?;
        let source_endpoint = read_u8(payload, &mut offset)?;
        let confirm_status = read_u8(payload, &mut offset)?;
        Ok(Self {
            request_id,
            destination,
            destination_endpoint,
            source_endpoint,
            confirm_status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateNeighborCommand {
    pub action: u8,
    pub short_address: u16,
    pub mac_address: u64,
}

impl UpdateNeighborCommand {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut offset = 0;
        let action = read_u8(payload, &mut offset)?;
        let short_address = read_u16(payload, &mut offset)?;
        let mac_address = read_u64(payload, &mut offset)?;
        Ok(Self {
            action,
            short_address,
            mac_address,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u8(&mut buf, self.action);
        write_u16(&mut buf, self.short_address);
        write_u64(&mut buf, self.mac_address);
        buf.push(UPDATE_NEIGHBOR_TRAILER);
        buf
    }
}

/// The closed set of ConBee commands this driver understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ReadFirmwareVersionRequest(ReadFirmwareVersionRequest),
    ReadFirmwareVersionResponse(ReadFirmwareVersionResponse),
    ReadParameterRequest(ReadParameterRequest),
    ReadParameterResponse(ReadParameterResponse),
    WriteParameterRequest(WriteParameterRequest),
    WriteParameterResponse(WriteParameterResponse),
    DeviceStateRequest(DeviceStateRequest),
    DeviceStateResponse(DeviceStateResponse),
    ReceivedDataNotification(ReceivedDataNotification),
    ReadReceivedDataRequest(ReadReceivedDataRequest),
    ReadReceivedDataResponse(ReadReceivedDataResponse),
    MacPollIndication(MacPollIndication),
    EnqueueSendDataRequest(EnqueueSendDataRequest),
    EnqueueSendDataResponse(EnqueueSendDataResponse),
    QuerySendDataRequest(QuerySendDataRequest),
    QuerySendDataResponse(QuerySendDataResponse),
    UpdateNeighborCommand(UpdateNeighborCommand),
}

/// Parameter identifiers accepted by `ReadParameter`/`WriteParameter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NetParam {
    NetworkAddress = 0x07,
    NetworkKey = 0x18,
    PermitJoin = 0x21,
    WatchdogTtl = 0x26,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_firmware_version_request_round_trips() {
        let value = ReadFirmwareVersionRequest {
            reserved: FIRMWARE_VERSION_REQUEST_RESERVED,
        };
        let bytes = value.serialize();
        assert_eq!(bytes, vec![0x00, 0x00, 0xEE, 0x02]);
        assert_eq!(ReadFirmwareVersionRequest::parse(&bytes).unwrap(), value);
    }

    #[test]
    fn read_parameter_round_trips_through_payload_region() {
        let value = ReadParameterRequest { parameter_id: 0x21 };
        let bytes = value.serialize();
        assert_eq!(bytes, vec![0x01, 0x00, 0x21]);
        assert_eq!(ReadParameterRequest::parse(&bytes).unwrap(), value);
    }

    #[test]
    fn write_parameter_carries_value_bytes() {
        let value = WriteParameterRequest {
            parameter_id: NetParam::WatchdogTtl as u8,
            value: vec![0x10, 0x0e, 0x00, 0x00],
        };
        let bytes = value.serialize();
        assert_eq!(WriteParameterRequest::parse(&bytes).unwrap(), value);
    }

    #[test]
    fn update_neighbor_command_appends_trailer_byte() {
        let value = UpdateNeighborCommand {
            action: 0x01,
            short_address: 0x1234,
            mac_address: 0x0011223344556677,
        };
        let bytes = value.serialize();
        assert_eq!(*bytes.last().unwrap(), UPDATE_NEIGHBOR_TRAILER);
    }

    #[test]
    fn enqueue_send_data_suppresses_endpoint_for_group_destination() {
        let value = EnqueueSendDataRequest {
            request_id: 1,
            flags: 0,
            destination: Address::Group(0x9001),
            destination_endpoint: 0,
            profile_id: 0x0104,
            cluster_id: 0x0006,
            source_endpoint: 1,
            data: vec![0x01],
            radius: 0,
        };
        let bytes = value.serialize();
        let parsed = EnqueueSendDataRequest::parse(&bytes).unwrap();
        assert_eq!(parsed.destination, Address::Group(0x9001));
        assert_eq!(parsed.data, vec![0x01]);
    }

    #[test]
    fn read_received_data_response_round_trips() {
        let value = ReadReceivedDataResponse {
            device_state: 0x9c,
            destination: Address::Nwk(0x0000),
            destination_endpoint: 0x01,
            source: Address::Nwk(0x1234),
            source_endpoint: 0x01,
            profile_id: 0x0104,
            cluster_id: 0x0006,
            data: vec![0x01, 0x02, 0x03],
            link_quality: 0xa5,
            rssi: -42,
        };
        let bytes = value.serialize();
        assert_eq!(ReadReceivedDataResponse::parse(&bytes).unwrap(), value);
    }

    #[test]
    fn read_received_data_response_keeps_endpoint_for_group_destination() {
        let value = ReadReceivedDataResponse {
            device_state: 0x9c,
            destination: Address::Group(0x9001),
            destination_endpoint: 0x01,
            source: Address::Nwk(0x1234),
            source_endpoint: 0x01,
            profile_id: 0x0104,
            cluster_id: 0x0006,
            data: vec![],
            link_quality: 0,
            rssi: 0,
        };
        let bytes = value.serialize();
        let parsed = ReadReceivedDataResponse::parse(&bytes).unwrap();
        assert_eq!(parsed.destination_endpoint, 0x01);
        assert_eq!(parsed, value);
    }
}
