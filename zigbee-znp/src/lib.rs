pub mod codec;
pub mod commands;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod registry;
pub mod settings;

pub use commands::{Command, DeviceState};
pub use controller::ZnpController;
pub use error::{Error, Result};
pub use settings::ZnpSettings;
