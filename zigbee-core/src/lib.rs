pub mod address;
pub mod controller;
pub mod error;
pub mod handler;
pub mod message;
pub mod profile;
pub mod transport;

pub use address::{Address, AddressMode, ExtendedAddress};
pub use controller::{Controller, ControllerFactory};
pub use error::{Error, Result};
pub use handler::{HandlerMap, Token};
pub use message::{IncomingMessage, OutgoingMessage};
pub use profile::{ProfileId, BRINGUP_ENDPOINTS};
