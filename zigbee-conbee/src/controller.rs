use std::sync::mpsc::Receiver;
use std::sync::Arc;

use log::{info, warn};
use zigbee_core::address::{Address, AddressMode};
use zigbee_core::message::{IncomingMessage, OutgoingMessage};
use zigbee_core::profile::ProfileId;
use zigbee_core::transport::Transport;

use crate::commands::{
    Command, EnqueueSendDataRequest, NetParam, ReadFirmwareVersionRequest,
    ReadReceivedDataRequest, ReadReceivedDataResponse, WriteParameterRequest,
    FIRMWARE_VERSION_REQUEST_RESERVED,
};
use crate::dispatcher::Port;
use crate::error::{Error, Result};
use crate::registry::RECEIVED_DATA_NOTIFICATION;
use crate::settings::ConbeeSettings;

/// Hardcoded application profile for outgoing APS data requests. The
/// original source carries the same constant with an `@Todo: Hardcoded`
/// note rather than threading a profile id through the send path; preserved
/// here rather than silently generalized.
const SEND_PROFILE_ID: u16 = 0x0104;

/// Byte value `WriteParameter(PermitJoin)` takes to enable joining, per the
/// dongle's firmware contract rather than an encoded duration.
const PERMIT_JOIN_ENABLED: u8 = 59;

/// A live ConBee coordinator session.
pub struct ConbeeController {
    port: Arc<Port>,
    settings: ConbeeSettings,
    next_request_id: std::sync::atomic::AtomicU8,
    incoming_rx: std::sync::Mutex<Option<Receiver<IncomingMessage>>>,
}

impl ConbeeController {
    /// Bring up a coordinator over `transport`: confirm firmware version,
    /// arm the watchdog and keep it refreshed, and start forwarding
    /// incoming APS data indications.
    pub fn bring_up(transport: Box<dyn Transport>) -> Result<Self> {
        Self::bring_up_with_settings(transport, ConbeeSettings::default())
    }

    /// Bring up a coordinator with non-default timeouts/watchdog cadence.
    pub fn bring_up_with_settings(
        transport: Box<dyn Transport>,
        settings: ConbeeSettings,
    ) -> Result<Self> {
        let port = Port::spawn(transport);
        let bringup_timeout = settings.bringup_timeout;

        info!("conbee: requesting firmware version");
        let version = port.write_command_timeout(
            Command::ReadFirmwareVersionRequest(ReadFirmwareVersionRequest {
                reserved: FIRMWARE_VERSION_REQUEST_RESERVED,
            }),
            bringup_timeout,
        )?;
        match version {
            Command::ReadFirmwareVersionResponse(resp) => {
                info!("conbee: firmware version {:#010x}", resp.version);
            }
            _ => return Err(Error::BringUpFailed),
        }

        arm_watchdog(&port, settings.watchdog_ttl_secs, bringup_timeout)?;
        spawn_watchdog_refresh(port.clone(), settings.clone());

        let (_token, notification_rx) = port.register_permanent_handler(RECEIVED_DATA_NOTIFICATION)?;
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        let forwarder_port = port.clone();
        std::thread::spawn(move || {
            for command in notification_rx {
                if !matches!(command, Command::ReceivedDataNotification(_)) {
                    continue;
                }
                match forwarder_port.write_command_timeout(
                    Command::ReadReceivedDataRequest(ReadReceivedDataRequest),
                    bringup_timeout,
                ) {
                    Ok(Command::ReadReceivedDataResponse(indication)) => {
                        if tx.send(translate_incoming(indication)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => warn!("conbee: unexpected response to ReadReceivedData"),
                    Err(err) => warn!("conbee: failed to read received data: {err}"),
                }
            }
        });

        Ok(Self {
            port,
            settings,
            next_request_id: std::sync::atomic::AtomicU8::new(0),
            incoming_rx: std::sync::Mutex::new(Some(rx)),
        })
    }
}

fn arm_watchdog(port: &Arc<Port>, ttl_secs: u32, timeout: std::time::Duration) -> Result<()> {
    port.write_command_timeout(
        Command::WriteParameterRequest(WriteParameterRequest {
            parameter_id: NetParam::WatchdogTtl as u8,
            value: ttl_secs.to_le_bytes().to_vec(),
        }),
        timeout,
    )?;
    Ok(())
}

/// Refresh the watchdog at `settings.watchdog_refresh_interval` for the
/// lifetime of `port`. Unlike the original source, which spawns this as a
/// goroutine with no cancellation (leaking it for up to 30 minutes past
/// shutdown), this thread exits as soon as a write fails, which happens
/// promptly once the underlying transport is closed.
fn spawn_watchdog_refresh(port: Arc<Port>, settings: ConbeeSettings) {
    std::thread::spawn(move || loop {
        std::thread::sleep(settings.watchdog_refresh_interval);
        if arm_watchdog(&port, settings.watchdog_ttl_secs, settings.bringup_timeout).is_err() {
            return;
        }
    });
}

fn translate_incoming(resp: ReadReceivedDataResponse) -> IncomingMessage {
    IncomingMessage {
        source: resp.source,
        destination: resp.destination,
        source_endpoint: resp.source_endpoint,
        destination_endpoint: resp.destination_endpoint,
        profile_id: ProfileId(resp.profile_id),
        cluster_id: resp.cluster_id,
        link_quality: resp.link_quality,
        data: resp.data,
    }
}

impl zigbee_core::controller::Controller for ConbeeController {
    fn incoming(&self) -> zigbee_core::Result<Receiver<IncomingMessage>> {
        self.incoming_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(zigbee_core::Error::HandlerConflict)
    }

    fn send(&self, message: OutgoingMessage) -> zigbee_core::Result<()> {
        if !matches!(
            message.destination.mode(),
            AddressMode::Nwk | AddressMode::Group | AddressMode::Ieee | AddressMode::Combined
        ) {
            return Err(zigbee_core::Error::Unsupported);
        }

        let request_id = self
            .next_request_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        self.port
            .write_command_timeout(
                Command::EnqueueSendDataRequest(EnqueueSendDataRequest {
                    request_id,
                    flags: 0,
                    destination: message.destination,
                    destination_endpoint: message.destination_endpoint,
                    profile_id: SEND_PROFILE_ID,
                    cluster_id: message.cluster_id,
                    source_endpoint: message.source_endpoint,
                    data: message.data,
                    radius: message.radius,
                }),
                self.settings.request_timeout,
            )
            .map_err(|e| zigbee_core::Error::Transport(e.to_string()))?;
        Ok(())
    }

    fn permit_join(&self, duration_secs: u8) -> zigbee_core::Result<()> {
        let value = if duration_secs > 0 { PERMIT_JOIN_ENABLED } else { 0 };
        self.port
            .write_command_timeout(
                Command::WriteParameterRequest(WriteParameterRequest {
                    parameter_id: NetParam::PermitJoin as u8,
                    value: vec![value],
                }),
                self.settings.request_timeout,
            )
            .map_err(|e| zigbee_core::Error::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Construct and bring up a ConBee controller, for registration with
/// `zigbee_core::controller`.
pub fn factory(
    transport: Box<dyn Transport>,
) -> zigbee_core::Result<Box<dyn zigbee_core::Controller>> {
    let controller = ConbeeController::bring_up(transport)
        .map_err(|e| zigbee_core::Error::Transport(e.to_string()))?;
    Ok(Box::new(controller))
}

/// Register the `"conbee"` controller family. Call once at process start.
pub fn register() {
    zigbee_core::controller::register("conbee", factory);
}
