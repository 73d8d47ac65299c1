/// A completion code as returned in the first data byte of every IPMI
/// response. `0x00` is success and is not represented here — callers check
/// `Response::cc() == 0` before constructing a `CompletionCode`.
///
/// This is a closed tagged enum with residual `Oem`/`CommandSpecific`/
/// `Reserved` arms, following the teacher's `CompletionErrorCode` structural
/// pattern (`src/connection/completion_code.rs` in the original), but the
/// code-to-variant mapping itself follows this crate's own taxonomy (see
/// the module-level table below) rather than the teacher's, since the two
/// don't agree on several codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CompletionCode {
    NodeBusy,
    InvalidCommand,
    InvalidCommandForLun,
    ProcessingTimeout,
    OutOfSpace,
    /// `0xC5` — the reservation used by this `GetSDR` no longer exists.
    ReservationCanceled,
    RequestDataTruncated,
    RequestDataLenInvalid,
    RequestDataLengthLimitExceeded,
    ParameterOutOfRange,
    /// `0xCA` — fewer bytes are available than were requested; the command
    /// layer keeps and returns the partial payload (§4.4).
    BufferTooSmall,
    /// `0xCB` — the addressed sensor does not exist (e.g. unpopulated
    /// hardware); quiet at info level, used to prune sensors during scan.
    SensorNotFound,
    InvalidDataFieldInRequest,
    CommandIllegalForSensorOrRecord,
    ResponseUnavailable,
    CannotExecuteDuplicateRequest,
    /// `0xD1` — also synthesized by `GetDeviceID` when the BMC reports
    /// `update_in_progress`.
    FwUpdateInProgress,
    /// `0xD2..0xD4` — destination/privilege/state related failures.
    DestinationUnavailable,
    InsufficientPrivilege,
    /// `0xD5` — quiet; used to prune sensors that can't be read right now
    /// when the caller opts into dropping them.
    CmdTempUnsupported,
    /// `0xDC..0xDF` — repository/device update in progress, temporarily
    /// unavailable. See [`CompletionCode::is_temporarily_unavailable`].
    RepoTemporarilyUnavailable,
    Unspecified,
    /// `0x01..=0x7E` — OEM-defined, outside the generic completion codes.
    Oem(u8),
    /// `0x80..=0xBE` — command-specific codes defined per-command.
    CommandSpecific(u8),
    /// Anything not otherwise classified.
    Reserved(u8),
}

impl From<u8> for CompletionCode {
    fn from(value: u8) -> Self {
        match value {
            0xC0 => Self::NodeBusy,
            0xC1 => Self::InvalidCommand,
            0xC2 => Self::InvalidCommandForLun,
            0xC3 => Self::ProcessingTimeout,
            0xC4 => Self::OutOfSpace,
            0xC5 => Self::ReservationCanceled,
            0xC6 => Self::RequestDataTruncated,
            0xC7 => Self::RequestDataLenInvalid,
            0xC8 => Self::RequestDataLengthLimitExceeded,
            0xC9 => Self::ParameterOutOfRange,
            0xCA => Self::BufferTooSmall,
            0xCB => Self::SensorNotFound,
            0xCC => Self::InvalidDataFieldInRequest,
            0xCD => Self::CommandIllegalForSensorOrRecord,
            0xCE => Self::ResponseUnavailable,
            0xCF => Self::CannotExecuteDuplicateRequest,
            0xD1 => Self::FwUpdateInProgress,
            0xD2 | 0xD3 => Self::DestinationUnavailable,
            0xD4 => Self::InsufficientPrivilege,
            0xD5 => Self::CmdTempUnsupported,
            0xDC..=0xDF => Self::RepoTemporarilyUnavailable,
            0xFF => Self::Unspecified,
            0x01..=0x7E => Self::Oem(value),
            0x80..=0xBE => Self::CommandSpecific(value),
            v => Self::Reserved(v),
        }
    }
}

impl From<CompletionCode> for u8 {
    fn from(value: CompletionCode) -> Self {
        match value {
            CompletionCode::NodeBusy => 0xC0,
            CompletionCode::InvalidCommand => 0xC1,
            CompletionCode::InvalidCommandForLun => 0xC2,
            CompletionCode::ProcessingTimeout => 0xC3,
            CompletionCode::OutOfSpace => 0xC4,
            CompletionCode::ReservationCanceled => 0xC5,
            CompletionCode::RequestDataTruncated => 0xC6,
            CompletionCode::RequestDataLenInvalid => 0xC7,
            CompletionCode::RequestDataLengthLimitExceeded => 0xC8,
            CompletionCode::ParameterOutOfRange => 0xC9,
            CompletionCode::BufferTooSmall => 0xCA,
            CompletionCode::SensorNotFound => 0xCB,
            CompletionCode::InvalidDataFieldInRequest => 0xCC,
            CompletionCode::CommandIllegalForSensorOrRecord => 0xCD,
            CompletionCode::ResponseUnavailable => 0xCE,
            CompletionCode::CannotExecuteDuplicateRequest => 0xCF,
            CompletionCode::FwUpdateInProgress => 0xD1,
            CompletionCode::DestinationUnavailable => 0xD2,
            CompletionCode::InsufficientPrivilege => 0xD4,
            CompletionCode::CmdTempUnsupported => 0xD5,
            CompletionCode::RepoTemporarilyUnavailable => 0xDC,
            CompletionCode::Unspecified => 0xFF,
            CompletionCode::Oem(v) => v,
            CompletionCode::CommandSpecific(v) => v,
            CompletionCode::Reserved(v) => v,
        }
    }
}

impl CompletionCode {
    /// True iff `code` is one of `0xDC..=0xDF`, the "temporarily
    /// unavailable, update in progress" family (§7, §8 property #10).
    pub fn is_temporarily_unavailable(code: u8) -> bool {
        matches!(code, 0xDC..=0xDF)
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_unavailable_classification() {
        for c in 0xDCu8..=0xDF {
            assert!(CompletionCode::is_temporarily_unavailable(c));
        }
        for c in 0xD0u8..=0xDB {
            assert!(!CompletionCode::is_temporarily_unavailable(c));
        }
        for c in 0xE0u16..=0xFF {
            assert!(!CompletionCode::is_temporarily_unavailable(c as u8));
        }
    }

    #[test]
    fn named_codes_roundtrip() {
        for raw in [0xC5u8, 0xCA, 0xCB, 0xD1, 0xD5, 0xC1, 0xC4] {
            let code = CompletionCode::from(raw);
            assert!(!code.is_reserved());
            assert_eq!(u8::from(code), raw);
        }
    }
}
