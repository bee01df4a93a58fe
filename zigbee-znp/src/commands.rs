use crate::znp_command;

znp_command! {
    pub struct SysVersionRequest {}
}

znp_command! {
    pub struct SysVersionResponse {
        pub transport_rev: u8,
        pub product: u8,
        pub major_rel: u8,
        pub minor_rel: u8,
        pub maint_rel: u8,
        pub revision: u32,
    }
}

znp_command! {
    pub struct UtilGetDeviceInfoRequest {}
}

znp_command! {
    pub struct UtilGetDeviceInfoResponse {
        pub status: u8,
        pub ieee_addr: u64,
        pub short_addr: u16,
        pub device_type: u8,
        pub device_state: u8;
        seq pub assoc_devices: Vec<u16>,
    }
}

znp_command! {
    pub struct AfRegisterRequest {
        pub endpoint: u8,
        pub app_profile_id: u16,
        pub app_device_id: u16,
        pub add_dev_ver: u8,
        pub latency_req: u8;
        seq pub app_in_clusters: Vec<u16>,
        pub app_out_clusters: Vec<u16>,
    }
}

znp_command! {
    pub struct AfRegisterResponse {
        pub status: u8,
    }
}

znp_command! {
    pub struct AfIncomingMsg {
        pub group_id: u16,
        pub cluster_id: u16,
        pub src_addr: u16,
        pub src_endpoint: u8,
        pub dst_endpoint: u8,
        pub was_broadcast: u8,
        pub link_quality: u8,
        pub secure_use: u8,
        pub time_stamp: u32,
        pub trans_seq_number: u8;
        seq pub data: Vec<u8>,
    }
}

znp_command! {
    pub struct AfDataRequest {
        pub dst_addr: u16,
        pub dst_endpoint: u8,
        pub src_endpoint: u8,
        pub cluster_id: u16,
        pub trans_id: u8,
        pub options: u8,
        pub radius: u8;
        seq pub data: Vec<u8>,
    }
}

znp_command! {
    pub struct AfDataConfirm {
        pub status: u8,
        pub endpoint: u8,
        pub trans_id: u8,
    }
}

znp_command! {
    pub struct ZdoMgmtPermitJoinRequest {
        pub addr_mode: u8,
        pub dst_addr: u16,
        pub duration: u8,
        pub tc_significance: u8,
    }
}

znp_command! {
    pub struct ZdoMgmtPermitJoinResponse {
        pub status: u8,
    }
}

znp_command! {
    pub struct ZdoStartupFromAppRequest {
        pub start_delay: u16,
    }
}

znp_command! {
    pub struct ZdoStartupFromAppResponse {
        pub status: u8,
    }
}

znp_command! {
    pub struct ZdoStateChangeInd {
        pub state: u8,
    }
}

znp_command! {
    pub struct ZdoEndDeviceAnnceInd {
        pub nwk_addr: u16,
        pub ieee_addr: u64,
        pub capabilities: u8,
    }
}

znp_command! {
    pub struct ZdoTcDevInd {
        pub nwk_addr: u16,
        pub ieee_addr: u64,
        pub parent_addr: u16,
    }
}

znp_command! {
    pub struct ZdoPermitJoinInd {
        pub duration: u8,
    }
}

znp_command! {
    pub struct ZdoActiveEpRequest {
        pub dst_addr: u16,
        pub nwk_addr_of_interest: u16,
    }
}

znp_command! {
    pub struct ZdoActiveEpResponse {
        pub status: u8,
        pub nwk_addr: u16,
        pub active_ep_count: u8;
        seq pub active_ep_list: Vec<u8>,
    }
}

znp_command! {
    pub struct ZdoActiveEpInd {
        pub src_addr: u16,
        pub status: u8,
        pub nwk_addr: u16,
        pub active_ep_count: u8;
        seq pub active_ep_list: Vec<u8>,
    }
}

/// Device state reported by `UtilGetDeviceInfoResponse`/`ZdoStateChangeInd`.
/// Coordinator bring-up waits for `Coordinator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceState {
    InitializedNotStarted = 0x00,
    InitializedNotConnected = 0x01,
    DiscoveringPans = 0x02,
    Joining = 0x03,
    ReJoining = 0x04,
    JoinedNotAuthenticated = 0x05,
    JoinedAsEndDevice = 0x06,
    JoinedAsRouter = 0x07,
    StartingAsCoordinator = 0x08,
    Coordinator = 0x09,
    Orphan = 0x0A,
}

impl DeviceState {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::InitializedNotStarted,
            0x01 => Self::InitializedNotConnected,
            0x02 => Self::DiscoveringPans,
            0x03 => Self::Joining,
            0x04 => Self::ReJoining,
            0x05 => Self::JoinedNotAuthenticated,
            0x06 => Self::JoinedAsEndDevice,
            0x07 => Self::JoinedAsRouter,
            0x08 => Self::StartingAsCoordinator,
            0x09 => Self::Coordinator,
            0x0A => Self::Orphan,
            _ => return None,
        })
    }
}

/// The closed set of ZNP commands this driver understands. Unlike the
/// reflective original, adding a command means adding a variant here — the
/// compiler rejects a mismatch between registry and codec instead of a
/// runtime panic surfacing only when the command is actually used.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SysVersionRequest(SysVersionRequest),
    SysVersionResponse(SysVersionResponse),
    UtilGetDeviceInfoRequest(UtilGetDeviceInfoRequest),
    UtilGetDeviceInfoResponse(UtilGetDeviceInfoResponse),
    AfRegisterRequest(AfRegisterRequest),
    AfRegisterResponse(AfRegisterResponse),
    AfIncomingMsg(AfIncomingMsg),
    AfDataRequest(AfDataRequest),
    AfDataConfirm(AfDataConfirm),
    ZdoMgmtPermitJoinRequest(ZdoMgmtPermitJoinRequest),
    ZdoMgmtPermitJoinResponse(ZdoMgmtPermitJoinResponse),
    ZdoStartupFromAppRequest(ZdoStartupFromAppRequest),
    ZdoStartupFromAppResponse(ZdoStartupFromAppResponse),
    ZdoStateChangeInd(ZdoStateChangeInd),
    ZdoEndDeviceAnnceInd(ZdoEndDeviceAnnceInd),
    ZdoTcDevInd(ZdoTcDevInd),
    ZdoPermitJoinInd(ZdoPermitJoinInd),
    ZdoActiveEpRequest(ZdoActiveEpRequest),
    ZdoActiveEpResponse(ZdoActiveEpResponse),
    ZdoActiveEpInd(ZdoActiveEpInd),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_version_response_round_trips() {
        let value = SysVersionResponse {
            transport_rev: 2,
            product: 0,
            major_rel: 2,
            minor_rel: 6,
            maint_rel: 3,
            revision: 20190608,
        };
        let bytes = value.encode();
        assert_eq!(SysVersionResponse::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn af_register_request_round_trips_with_two_sequences() {
        let value = AfRegisterRequest {
            endpoint: 1,
            app_profile_id: 0x0104,
            app_device_id: 0x0005,
            add_dev_ver: 0,
            latency_req: 0,
            app_in_clusters: vec![0x0000, 0x0006],
            app_out_clusters: vec![],
        };
        let bytes = value.encode();
        assert_eq!(AfRegisterRequest::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn device_state_from_byte_covers_coordinator() {
        assert_eq!(DeviceState::from_byte(0x09), Some(DeviceState::Coordinator));
        assert_eq!(DeviceState::from_byte(0xFF), None);
    }
}
