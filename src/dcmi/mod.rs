//! DCMI group-extension commands (NetFn `0x2C`/`0x2D`, group extension id
//! `0xDC`). Only `Get Power Reading` is implemented; the rest of the DCMI
//! command set (asset tag, thermal limits, management controller identifier)
//! is out of scope.

mod get_power_reading;
pub use get_power_reading::{DcmiPowerReading, GetDcmiPowerReading, GetDcmiPowerReadingError};
