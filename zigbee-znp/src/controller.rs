use std::sync::mpsc::Receiver;
use std::sync::Arc;

use log::info;
use zigbee_core::address::{Address, AddressMode};
use zigbee_core::message::{IncomingMessage, OutgoingMessage};
use zigbee_core::profile::{ProfileId, BRINGUP_ENDPOINTS};
use zigbee_core::transport::Transport;

use crate::commands::{
    AfDataRequest, AfIncomingMsg, AfRegisterRequest, Command, DeviceState,
    SysVersionRequest, UtilGetDeviceInfoRequest, ZdoMgmtPermitJoinRequest,
    ZdoStartupFromAppRequest, ZdoStateChangeInd,
};
use crate::dispatcher::Port;
use crate::error::{Error, Result};
use crate::frame::{FrameType, Subsystem};
use crate::settings::ZnpSettings;

/// `app_device_id`/`latency_req` used for every bring-up endpoint
/// registration, per spec §4.E step 4.
const BRINGUP_APP_DEVICE_ID: u16 = 0x0005;
const LATENCY_NONE: u8 = 0x00;

/// A live ZNP coordinator session.
pub struct ZnpController {
    port: Arc<Port>,
    settings: ZnpSettings,
    next_trans_id: std::sync::atomic::AtomicU8,
    incoming_rx: std::sync::Mutex<Option<Receiver<IncomingMessage>>>,
}

fn header(frame_type: FrameType, subsystem: Subsystem, id: u8) -> crate::frame::FrameHeader {
    crate::frame::FrameHeader {
        frame_type,
        subsystem,
        id,
    }
}

impl ZnpController {
    /// Bring up a coordinator over `transport`: skip the bootloader wait,
    /// confirm firmware version, ensure the device is in the `Coordinator`
    /// role, register the seven well-known endpoints, and start forwarding
    /// incoming application messages.
    pub fn bring_up(transport: Box<dyn Transport>) -> Result<Self> {
        Self::bring_up_with_settings(transport, ZnpSettings::default())
    }

    /// Bring up a coordinator with non-default timeouts.
    pub fn bring_up_with_settings(transport: Box<dyn Transport>, settings: ZnpSettings) -> Result<Self> {
        let port = Port::spawn(transport);
        let bringup_timeout = settings.bringup_timeout;

        // Step 1: magic byte skips the bootloader's 60s wait.
        port.write_raw_magic_byte()?;

        // Step 2: confirm communication.
        info!("znp: requesting SysVersion");
        let _ = port.write_command_timeout(
            Command::SysVersionRequest(SysVersionRequest {}),
            bringup_timeout,
        )?;

        // Step 3: ensure coordinator role.
        info!("znp: requesting UtilGetDeviceInfo");
        let info_response = port.write_command_timeout(
            Command::UtilGetDeviceInfoRequest(UtilGetDeviceInfoRequest {}),
            bringup_timeout,
        )?;
        let device_state = match info_response {
            Some(Command::UtilGetDeviceInfoResponse(resp)) => resp.device_state,
            _ => return Err(Error::BringUpFailed),
        };

        if DeviceState::from_byte(device_state) != Some(DeviceState::Coordinator) {
            info!("znp: device not yet coordinator, issuing ZdoStartupFromApp");
            let state_change_header = header(FrameType::Areq, Subsystem::Zdo, 0xC0);
            let (_token, state_rx) = port.register_permanent_handler(state_change_header)?;

            let _ = port.write_command_timeout(
                Command::ZdoStartupFromAppRequest(ZdoStartupFromAppRequest { start_delay: 100 }),
                bringup_timeout,
            )?;

            match state_rx.recv_timeout(bringup_timeout) {
                Ok(Command::ZdoStateChangeInd(ZdoStateChangeInd { state })) => {
                    info!("znp: state changed to {state:#04x}");
                }
                _ => return Err(Error::BringUpFailed),
            }
        }

        // Step 4: register the well-known endpoints.
        for &(endpoint, profile) in BRINGUP_ENDPOINTS.iter() {
            info!("znp: registering endpoint {endpoint} on profile {profile}");
            let _ = port.write_command_timeout(
                Command::AfRegisterRequest(AfRegisterRequest {
                    endpoint,
                    app_profile_id: profile.0,
                    app_device_id: BRINGUP_APP_DEVICE_ID,
                    add_dev_ver: 0,
                    latency_req: LATENCY_NONE,
                    app_in_clusters: vec![],
                    app_out_clusters: vec![],
                }),
                bringup_timeout,
            )?;
        }

        // Step 5: forward incoming application messages.
        let incoming_header = header(FrameType::Areq, Subsystem::Af, 0x81);
        let (_token, af_rx) = port.register_permanent_handler(incoming_header)?;
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            for command in af_rx {
                if let Command::AfIncomingMsg(msg) = command {
                    let incoming = translate_incoming(msg);
                    if tx.send(incoming).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Self {
            port,
            settings,
            next_trans_id: std::sync::atomic::AtomicU8::new(0),
            incoming_rx: std::sync::Mutex::new(Some(rx)),
        })
    }
}

fn translate_incoming(msg: AfIncomingMsg) -> IncomingMessage {
    IncomingMessage {
        source: Address::Nwk(msg.src_addr),
        destination: if msg.group_id != 0 {
            Address::Group(msg.group_id)
        } else {
            Address::None
        },
        source_endpoint: msg.src_endpoint,
        destination_endpoint: msg.dst_endpoint,
        profile_id: ProfileId::ZDP,
        cluster_id: msg.cluster_id,
        link_quality: msg.link_quality,
        data: msg.data,
    }
}

impl zigbee_core::controller::Controller for ZnpController {
    fn incoming(&self) -> Result<Receiver<IncomingMessage>> {
        self.incoming_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(Error::Core(zigbee_core::Error::HandlerConflict))
    }

    fn send(&self, message: OutgoingMessage) -> Result<()> {
        let dst_addr = match message.destination.mode() {
            AddressMode::Nwk | AddressMode::Combined => {
                message.destination.short().ok_or(Error::UnsupportedAddressMode)?
            }
            _ => return Err(Error::UnsupportedAddressMode),
        };

        let trans_id = self
            .next_trans_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let _ = self.port.write_command_timeout(
            Command::AfDataRequest(AfDataRequest {
                dst_addr,
                dst_endpoint: message.destination_endpoint,
                src_endpoint: message.source_endpoint,
                cluster_id: message.cluster_id,
                trans_id,
                options: 0,
                radius: message.radius,
                data: message.data,
            }),
            self.settings.request_timeout,
        )?;
        Ok(())
    }

    fn permit_join(&self, duration_secs: u8) -> Result<()> {
        let _ = self.port.write_command_timeout(
            Command::ZdoMgmtPermitJoinRequest(ZdoMgmtPermitJoinRequest {
                addr_mode: 0x0F,
                dst_addr: 0xFFFC,
                duration: if duration_secs > 0 { 0xFF } else { 0 },
                tc_significance: 0,
            }),
            self.settings.request_timeout,
        )?;
        Ok(())
    }
}

/// Construct and bring up a ZNP controller, for registration with
/// `zigbee_core::controller`.
pub fn factory(
    transport: Box<dyn Transport>,
) -> zigbee_core::Result<Box<dyn zigbee_core::Controller>> {
    let controller = ZnpController::bring_up(transport)
        .map_err(|e| zigbee_core::Error::Transport(e.to_string()))?;
    Ok(Box::new(controller))
}

/// Register the `"znp"` controller family. Call once at process start (the
/// CLI does this from `main`).
pub fn register() {
    zigbee_core::controller::register("znp", factory);
}
