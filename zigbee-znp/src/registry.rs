use std::collections::HashMap;
use std::sync::OnceLock;

use crate::commands::{
    AfDataConfirm, AfDataRequest, AfIncomingMsg, AfRegisterRequest, AfRegisterResponse, Command,
    SysVersionRequest, SysVersionResponse, UtilGetDeviceInfoRequest, UtilGetDeviceInfoResponse,
    ZdoActiveEpInd, ZdoActiveEpRequest, ZdoActiveEpResponse, ZdoEndDeviceAnnceInd,
    ZdoMgmtPermitJoinRequest, ZdoMgmtPermitJoinResponse, ZdoPermitJoinInd,
    ZdoStartupFromAppRequest, ZdoStartupFromAppResponse, ZdoStateChangeInd, ZdoTcDevInd,
};
use crate::error::{Error, Result};
use crate::frame::{FrameHeader, FrameType, Subsystem};

type DecodeFn = fn(&[u8]) -> Result<Command>;
type EncodeFn = fn(&Command) -> Option<Vec<u8>>;

struct Entry {
    header: FrameHeader,
    decode: DecodeFn,
    encode: EncodeFn,
}

fn entries() -> &'static [Entry] {
    macro_rules! entry {
        ($ty:ident, $frame_type:expr, $subsystem:expr, $id:expr) => {
            Entry {
                header: FrameHeader {
                    frame_type: $frame_type,
                    subsystem: $subsystem,
                    id: $id,
                },
                decode: |buf| $ty::decode(buf).map(Command::$ty),
                encode: |cmd| match cmd {
                    Command::$ty(inner) => Some(inner.encode()),
                    _ => None,
                },
            }
        };
    }

    static ENTRIES: OnceLock<Vec<Entry>> = OnceLock::new();
    ENTRIES.get_or_init(|| {
        vec![
            entry!(SysVersionRequest, FrameType::Sreq, Subsystem::Sys, 0x02),
            entry!(SysVersionResponse, FrameType::Srsp, Subsystem::Sys, 0x02),
            entry!(
                UtilGetDeviceInfoRequest,
                FrameType::Sreq,
                Subsystem::Util,
                0x00
            ),
            entry!(
                UtilGetDeviceInfoResponse,
                FrameType::Srsp,
                Subsystem::Util,
                0x00
            ),
            entry!(AfRegisterRequest, FrameType::Sreq, Subsystem::Af, 0x00),
            entry!(AfRegisterResponse, FrameType::Srsp, Subsystem::Af, 0x00),
            entry!(AfIncomingMsg, FrameType::Areq, Subsystem::Af, 0x81),
            entry!(AfDataRequest, FrameType::Sreq, Subsystem::Af, 0x01),
            entry!(AfDataConfirm, FrameType::Areq, Subsystem::Af, 0x80),
            entry!(
                ZdoMgmtPermitJoinRequest,
                FrameType::Sreq,
                Subsystem::Zdo,
                0x36
            ),
            entry!(
                ZdoMgmtPermitJoinResponse,
                FrameType::Srsp,
                Subsystem::Zdo,
                0x36
            ),
            entry!(
                ZdoStartupFromAppRequest,
                FrameType::Sreq,
                Subsystem::Zdo,
                0x40
            ),
            entry!(
                ZdoStartupFromAppResponse,
                FrameType::Srsp,
                Subsystem::Zdo,
                0x40
            ),
            entry!(ZdoStateChangeInd, FrameType::Areq, Subsystem::Zdo, 0xC0),
            entry!(ZdoEndDeviceAnnceInd, FrameType::Areq, Subsystem::Zdo, 0xC1),
            entry!(ZdoTcDevInd, FrameType::Areq, Subsystem::Zdo, 0xCA),
            entry!(ZdoPermitJoinInd, FrameType::Areq, Subsystem::Zdo, 0xCB),
            entry!(ZdoActiveEpRequest, FrameType::Sreq, Subsystem::Zdo, 0x05),
            entry!(ZdoActiveEpResponse, FrameType::Srsp, Subsystem::Zdo, 0x05),
            entry!(ZdoActiveEpInd, FrameType::Areq, Subsystem::Zdo, 0x85),
        ]
    })
}

fn index() -> &'static HashMap<(FrameType, Subsystem, u8), usize> {
    static INDEX: OnceLock<HashMap<(FrameType, Subsystem, u8), usize>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for (i, entry) in entries().iter().enumerate() {
            let key = (entry.header.frame_type, entry.header.subsystem, entry.header.id);
            if map.insert(key, i).is_some() {
                panic!("duplicate ZNP wire key registered: {key:?}");
            }
        }
        map
    })
}

/// Decode a payload given its wire header.
pub fn decode(header: FrameHeader, payload: &[u8]) -> Result<Command> {
    let key = (header.frame_type, header.subsystem, header.id);
    let idx = *index().get(&key).ok_or(Error::UnknownWireHeader(header))?;
    (entries()[idx].decode)(payload)
}

/// Encode a command's payload and return the wire header to send it with.
pub fn encode(command: &Command) -> (FrameHeader, Vec<u8>) {
    for entry in entries() {
        if let Some(bytes) = (entry.encode)(command) {
            return (entry.header, bytes);
        }
    }
    unreachable!("every Command variant has a registry entry")
}

/// The SRSP header expected in reply to a SREQ header, per the ZNP
/// convention that a synchronous request's response shares its Subsystem
/// and ID but uses frame type SRSP instead of SREQ.
pub fn expected_response_header(request: FrameHeader) -> FrameHeader {
    FrameHeader {
        frame_type: FrameType::Srsp,
        subsystem: request.subsystem,
        id: request.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SysVersionRequest;

    #[test]
    fn round_trips_through_registry() {
        let cmd = Command::SysVersionRequest(SysVersionRequest {});
        let (header, bytes) = encode(&cmd);
        assert_eq!(header.subsystem, Subsystem::Sys);
        let decoded = decode(header, &bytes).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn unknown_header_is_rejected() {
        let header = FrameHeader {
            frame_type: FrameType::Areq,
            subsystem: Subsystem::Debug,
            id: 0xFF,
        };
        assert!(matches!(
            decode(header, &[]),
            Err(Error::UnknownWireHeader(_))
        ));
    }

    #[test]
    fn expected_response_header_flips_type_only() {
        let req = FrameHeader {
            frame_type: FrameType::Sreq,
            subsystem: Subsystem::Sys,
            id: 0x02,
        };
        let resp = expected_response_header(req);
        assert_eq!(resp.frame_type, FrameType::Srsp);
        assert_eq!(resp.subsystem, Subsystem::Sys);
        assert_eq!(resp.id, 0x02);
    }
}
