use std::num::NonZeroU16;

use crate::connection::{CompletionCode, IpmiCommand, Message, NetFn};

/// The `ReserveSDRRepo` command (Storage / `0x22`). Returns a 16-bit
/// reservation id, required by the BMC to read SDR records atomically
/// (§3 "SDR reservation envelope").
#[derive(Clone, Copy, Debug, Default)]
pub struct ReserveSdrRepository;

impl From<ReserveSdrRepository> for Message {
    fn from(_: ReserveSdrRepository) -> Self {
        Message::new_request(NetFn::Storage, 0x22, Vec::new())
    }
}

/// Error reserving the SDR repository.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReserveError {
    NotEnoughData,
    /// The BMC does not support reservations (some devices return an
    /// id of `0`, which is a valid "no reservation needed" sentinel).
    Zero,
}

impl IpmiCommand for ReserveSdrRepository {
    type Output = NonZeroU16;

    type Error = ReserveError;

    fn handle_completion_code(_: CompletionCode, _: &[u8]) -> Option<Self::Error> {
        None
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        if data.len() < 2 {
            return Err(ReserveError::NotEnoughData);
        }

        let id = u16::from_le_bytes([data[0], data[1]]);
        NonZeroU16::new(id).ok_or(ReserveError::Zero)
    }
}
