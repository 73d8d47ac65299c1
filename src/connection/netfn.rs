/// IPMI network function code, selecting a command family.
///
/// Request netfns are even, response netfns are the same value plus one
/// (IPMI v2.0 §5.1). Only the families this crate's command layer uses are
/// named; anything else round-trips through `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetFn {
    /// `0x06`/`0x07` — chassis/device commands (Get Device ID).
    App,
    /// `0x0A`/`0x0B` — SDR repository and SEL commands.
    Storage,
    /// `0x04`/`0x05` — sensor/event commands (thresholds, readings, factors).
    SensorEvent,
    /// `0x2C`/`0x2D` — DCMI group-extension commands.
    Group,
    /// Anything else, keyed by its request-side value.
    Unknown(u8),
}

impl From<u8> for NetFn {
    fn from(value: u8) -> Self {
        match value {
            0x06 | 0x07 => Self::App,
            0x0A | 0x0B => Self::Storage,
            0x04 | 0x05 => Self::SensorEvent,
            0x2C | 0x2D => Self::Group,
            v => Self::Unknown(v),
        }
    }
}

impl NetFn {
    /// The request-side (even) value of this netfn.
    pub fn request_value(&self) -> u8 {
        match self {
            NetFn::App => 0x06,
            NetFn::Storage => 0x0A,
            NetFn::SensorEvent => 0x04,
            NetFn::Group => 0x2C,
            NetFn::Unknown(v) => {
                if v % 2 == 1 {
                    v - 1
                } else {
                    *v
                }
            }
        }
    }

    /// The response-side (odd) value of this netfn.
    pub fn response_value(&self) -> u8 {
        match self {
            NetFn::App => 0x07,
            NetFn::Storage => 0x0B,
            NetFn::SensorEvent => 0x05,
            NetFn::Group => 0x2D,
            NetFn::Unknown(v) => {
                if v % 2 == 0 {
                    v + 1
                } else {
                    *v
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_response_roundtrip() {
        for netfn in [NetFn::App, NetFn::Storage, NetFn::SensorEvent, NetFn::Group] {
            let req = netfn.request_value();
            let resp = netfn.response_value();
            assert_eq!(resp, req + 1);
            assert_eq!(NetFn::from(req), netfn);
        }
    }
}
