use crate::address::Address;
use crate::profile::ProfileId;

/// An application message received from the coordinator.
///
/// This is the value type every controller family normalizes its
/// family-specific indication (`AfIncomingMsg` for ZNP,
/// `ReadReceivedDataResponse` for ConBee) into before publishing it on the
/// outward channel. Cluster/profile interpretation (ZCL, ZDP) is an explicit
/// Non-goal; consumers get the raw envelope and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub source: Address,
    pub destination: Address,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub profile_id: ProfileId,
    pub cluster_id: u16,
    pub link_quality: u8,
    pub data: Vec<u8>,
}

/// An application message to hand to a controller's `send` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub destination: Address,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub profile_id: ProfileId,
    pub cluster_id: u16,
    pub radius: u8,
    pub data: Vec<u8>,
}
