//! App-netfn (`0x06`/`0x07`) commands: device identification.

mod get_device_id;
pub use get_device_id::{DeviceId, GetDeviceId, GetDeviceIdError};
