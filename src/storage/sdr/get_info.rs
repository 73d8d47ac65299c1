use crate::{
    connection::{IpmiCommand, Message, NetFn},
    storage::Timestamp,
    Loggable,
};

/// The `GetSDRRepoInfo` command (Storage / `0x20`). Only the primary LUN-0
/// repository is addressed (§1 Non-goals — no satellite-MC bridging).
#[derive(Clone, Copy, Debug, Default)]
pub struct GetSdrRepositoryInfo;

impl From<GetSdrRepositoryInfo> for Message {
    fn from(_: GetSdrRepositoryInfo) -> Self {
        Message::new_request(NetFn::Storage, 0x20, Vec::new())
    }
}

impl IpmiCommand for GetSdrRepositoryInfo {
    type Output = SdrRepositoryInfo;

    type Error = ();

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        SdrRepositoryInfo::parse(data).ok_or(())
    }
}

/// Free space remaining in the repository, in bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FreeSpace {
    Bytes(u16),
    Full,
    Unknown,
}

impl From<u16> for FreeSpace {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => Self::Full,
            0xFFFF => Self::Unknown,
            v => Self::Bytes(v),
        }
    }
}

/// Operations the repository supports (byte 14, table 33-12).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operation {
    pub get_sdr_repository_allocation_info: bool,
    pub reserve_sdr_repository_for_partial_add: bool,
    pub partial_add_sdr: bool,
    pub delete_sdr: bool,
    pub modal_update: bool,
    pub overflow: bool,
}

impl From<u8> for Operation {
    fn from(value: u8) -> Self {
        Self {
            get_sdr_repository_allocation_info: (value & 0x01) == 0x01,
            reserve_sdr_repository_for_partial_add: (value & 0x02) == 0x02,
            partial_add_sdr: (value & 0x04) == 0x04,
            delete_sdr: (value & 0x08) == 0x08,
            modal_update: (value & 0x20) == 0x20,
            overflow: (value & 0x80) == 0x80,
        }
    }
}

/// Repository-wide metadata (§3 "Repository info").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdrRepositoryInfo {
    pub version: u8,
    pub record_count: u16,
    pub free_space: FreeSpace,
    pub last_add: Timestamp,
    pub last_del: Timestamp,
    pub operation: Operation,
}

impl SdrRepositoryInfo {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 14 {
            return None;
        }

        let version = data[0];
        let record_count = u16::from_le_bytes([data[1], data[2]]);
        let free_space = FreeSpace::from(u16::from_le_bytes([data[3], data[4]]));
        let last_add = Timestamp::from(u32::from_le_bytes([data[5], data[6], data[7], data[8]]));
        let last_del =
            Timestamp::from(u32::from_le_bytes([data[9], data[10], data[11], data[12]]));
        let operation = Operation::from(data[13]);

        Some(Self {
            version,
            record_count,
            free_space,
            last_add,
            last_del,
            operation,
        })
    }
}

impl Loggable for SdrRepositoryInfo {
    fn as_log(&self) -> Vec<crate::fmt::LogItem> {
        crate::log_vec![
            (0, "SDR Repository Info"),
            (1, "Version", format!("0x{:02X}", self.version)),
            (1, "Record count", self.record_count),
            (1, "Free space", format!("{:?}", self.free_space)),
            (1, "Last addition", self.last_add),
            (1, "Last deletion", self.last_del)
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_vector() {
        let data = [
            0x51, 0x05, 0x00, 0x00, 0x04, 0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let info = SdrRepositoryInfo::parse(&data).unwrap();
        assert_eq!(info.version, 0x51);
        assert_eq!(info.record_count, 5);
        assert_eq!(u32::from(info.last_add), 0x04030201);
        assert_eq!(u32::from(info.last_del), 0);
    }
}
