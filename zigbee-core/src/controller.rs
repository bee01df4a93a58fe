use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};
use crate::message::{IncomingMessage, OutgoingMessage};
use crate::transport::Transport;

/// A running coordinator session: a bring-up has already completed and the
/// controller is ready to send and receive application messages.
pub trait Controller: Send {
    /// Start listening for incoming application messages. May only be
    /// called once; subsequent calls return [`Error::HandlerConflict`].
    fn incoming(&self) -> Result<Receiver<IncomingMessage>>;

    /// Send an application message to the network.
    fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Enable or disable network joining for the given duration in seconds
    /// (0 disables joining).
    fn permit_join(&self, duration_secs: u8) -> Result<()>;
}

/// Constructs and brings up a [`Controller`] of one coordinator family, given
/// an open transport.
pub type ControllerFactory =
    fn(Box<dyn Transport>) -> Result<Box<dyn Controller>>;

/// Process-wide table of coordinator families, keyed by name (`"znp"`,
/// `"conbee"`). Each family crate registers itself via [`register`] from a
/// `ctor`-free `static` initializer call in its own `lib.rs`; the CLI looks
/// controllers up by the name given on `--controller`.
fn registry() -> &'static Mutex<HashMap<&'static str, ControllerFactory>> {
    static REGISTRY: OnceLock<Mutex<HashMap<&'static str, ControllerFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a coordinator family under `name`. Panics if `name` is already
/// registered, mirroring the teacher's registries, which treat a duplicate
/// registration as a programmer error rather than a runtime condition.
pub fn register(name: &'static str, factory: ControllerFactory) {
    let mut reg = registry().lock().unwrap();
    if reg.contains_key(name) {
        panic!("controller family {name:?} already registered");
    }
    reg.insert(name, factory);
}

/// Look up and construct a controller by family name.
pub fn new_controller(name: &str, transport: Box<dyn Transport>) -> Result<Box<dyn Controller>> {
    let reg = registry().lock().unwrap();
    match reg.get(name) {
        Some(factory) => factory(transport),
        None => Err(Error::NotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct NullController;

    impl Controller for NullController {
        fn incoming(&self) -> Result<Receiver<IncomingMessage>> {
            let (_tx, rx) = mpsc::channel();
            Ok(rx)
        }

        fn send(&self, _message: OutgoingMessage) -> Result<()> {
            Ok(())
        }

        fn permit_join(&self, _duration_secs: u8) -> Result<()> {
            Ok(())
        }
    }

    fn null_factory(_transport: Box<dyn Transport>) -> Result<Box<dyn Controller>> {
        Ok(Box::new(NullController))
    }

    #[test]
    fn unregistered_family_is_not_found() {
        let result = new_controller("does-not-exist", unreachable_transport());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn registered_family_constructs() {
        register("test-null", null_factory);
        let controller = new_controller("test-null", unreachable_transport()).unwrap();
        assert!(controller.send(OutgoingMessage {
            destination: crate::address::Address::None,
            source_endpoint: 1,
            destination_endpoint: 1,
            profile_id: crate::profile::ProfileId::HOME_AUTOMATION,
            cluster_id: 0,
            radius: 0,
            data: vec![],
        })
        .is_ok());
    }

    fn unreachable_transport() -> Box<dyn Transport> {
        struct Unreachable;
        impl Transport for Unreachable {
            fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
                unreachable!()
            }
            fn flush(&mut self) -> std::io::Result<()> {
                unreachable!()
            }
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                unreachable!()
            }
            fn set_read_timeout(&mut self, _timeout: std::time::Duration) -> std::io::Result<()> {
                unreachable!()
            }
        }
        Box::new(Unreachable)
    }
}
