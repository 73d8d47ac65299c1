use std::num::NonZeroU16;

use nonmax::NonMaxU8;

use crate::connection::{CompletionCode, IpmiCommand, Message, NetFn};

use super::RecordId;

/// The `GetSDR` command (Storage / `0x23`), with a fixed offset of `0` and
/// `len=0xFF` (request everything the BMC will give us in one shot). The
/// reservation/retry ladder lives one layer up, in
/// [`super::reservation`] (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct GetSdr {
    reservation_id: Option<NonZeroU16>,
    record_id: RecordId,
    offset: u8,
    bytes_to_read: Option<NonMaxU8>,
}

impl GetSdr {
    pub fn new(reservation_id: Option<NonZeroU16>, record_id: RecordId) -> Self {
        Self {
            reservation_id,
            record_id,
            offset: 0,
            bytes_to_read: None,
        }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    /// Read only the record's 3-byte key (owner id/channel/LUN, sensor
    /// number) at its fixed offset right after the 5-byte record header,
    /// skipping the rest of the body. Used by [`super::ChangeDetector`] to
    /// cheaply confirm a cached sensor's identity hasn't moved (§4.6).
    pub fn key_only(record_id: RecordId) -> Self {
        Self {
            reservation_id: None,
            record_id,
            offset: 5,
            bytes_to_read: NonMaxU8::new(3),
        }
    }
}

impl From<GetSdr> for Message {
    fn from(value: GetSdr) -> Self {
        let mut data = vec![0u8; 6];

        data[0..2].copy_from_slice(
            &value
                .reservation_id
                .map(NonZeroU16::get)
                .unwrap_or(0)
                .to_le_bytes(),
        );
        data[2..4].copy_from_slice(&value.record_id.value().to_le_bytes());
        data[4] = value.offset;
        data[5] = value.bytes_to_read.map(|v| v.get()).unwrap_or(0xFF);

        Message::new_request(NetFn::Storage, 0x23, data)
    }
}

/// Errors specific to `GetSDR`. `ReservationCanceled` and `BufferTooSmall`
/// are not failures from the reservation controller's point of view —
/// they're handled specially (§4.4) — but they still need to surface
/// through the completion-code path since their ccode is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub enum GetSdrError {
    NotEnoughData,
    ReservationCanceled,
    BufferTooSmall,
}

impl IpmiCommand for GetSdr {
    type Output = SdrEntry;

    type Error = GetSdrError;

    fn handle_completion_code(
        completion_code: CompletionCode,
        _data: &[u8],
    ) -> Option<Self::Error> {
        match completion_code {
            CompletionCode::ReservationCanceled => Some(GetSdrError::ReservationCanceled),
            CompletionCode::BufferTooSmall => Some(GetSdrError::BufferTooSmall),
            _ => None,
        }
    }

    fn parse_success_response(data: &[u8]) -> Result<Self::Output, Self::Error> {
        SdrEntry::parse(data).ok_or(GetSdrError::NotEnoughData)
    }
}

/// The raw link-plus-payload a single `GetSDR` call returns: the next
/// record id in the repository's walk order, and whatever record bytes
/// the BMC returned at the requested offset.
#[derive(Debug, Clone)]
pub struct SdrEntry {
    pub next_entry: RecordId,
    pub data: Vec<u8>,
}

impl SdrEntry {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let next_entry = RecordId::new_raw(u16::from_le_bytes([data[0], data[1]]));

        Some(Self {
            next_entry,
            data: data[2..].to_vec(),
        })
    }
}
