use super::{LogicalUnit, Message, NetFn};

/// An outbound IPMI request, paired with the logical unit it targets.
///
/// Bridging to a satellite management controller over IPMB is out of scope
/// (§1 Non-goals) — every request targets the primary BMC's system
/// interface at the logical unit named by the command.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    lun: LogicalUnit,
    message: Message,
}

impl Request {
    pub const fn new(message: Message, lun: LogicalUnit) -> Self {
        Self { lun, message }
    }

    pub fn netfn(&self) -> NetFn {
        self.message.netfn()
    }

    pub fn netfn_raw(&self) -> u8 {
        self.message.netfn_raw()
    }

    pub fn lun(&self) -> LogicalUnit {
        self.lun
    }

    pub fn cmd(&self) -> u8 {
        self.message.cmd()
    }

    pub fn data(&self) -> &[u8] {
        self.message.data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.message.data_mut()
    }
}
