use crate::connection::{CompletionCode, NetFn};

/// The error type returned by [`crate::Ipmi::send_recv`].
///
/// Parameterized over the connection's own error type (`CON`) and the
/// command's response-parsing error type (`P`), following the teacher's
/// existing `IpmiError` shape.
#[derive(Clone, Debug, PartialEq)]
pub enum IpmiError<CON, P> {
    /// The caller supplied a netfn that is already a response netfn.
    NetFnIsResponse(NetFn),
    /// The response did not match the request that was sent.
    UnexpectedResponse {
        netfn_sent: NetFn,
        netfn_recvd: NetFn,
        cmd_sent: u8,
        cmd_recvd: u8,
    },
    /// The command reported a non-success completion code that it chose to
    /// surface as a typed error (see [`crate::connection::IpmiCommand::handle_completion_code`]).
    Command {
        error: P,
        netfn: NetFn,
        cmd: u8,
        completion_code: Option<CompletionCode>,
        data: Vec<u8>,
    },
    /// The completion code was non-success and the command did not handle
    /// it specially.
    Failed {
        netfn: NetFn,
        cmd: u8,
        completion_code: CompletionCode,
        data: Vec<u8>,
    },
    /// Parsing a success response failed.
    ParsingFailed {
        error: P,
        netfn: NetFn,
        cmd: u8,
        data: Vec<u8>,
    },
    /// The underlying connection failed.
    Connection(CON),
}

impl<CON, P> From<CON> for IpmiError<CON, P> {
    fn from(value: CON) -> Self {
        Self::Connection(value)
    }
}

impl<CON, P> IpmiError<CON, P> {
    pub fn map<CON2, F>(self, f: F) -> IpmiError<CON2, P>
    where
        F: FnOnce(CON) -> CON2,
    {
        match self {
            IpmiError::NetFnIsResponse(v) => IpmiError::NetFnIsResponse(v),
            IpmiError::UnexpectedResponse {
                netfn_sent,
                netfn_recvd,
                cmd_sent,
                cmd_recvd,
            } => IpmiError::UnexpectedResponse {
                netfn_sent,
                netfn_recvd,
                cmd_sent,
                cmd_recvd,
            },
            IpmiError::Command {
                error,
                netfn,
                cmd,
                completion_code,
                data,
            } => IpmiError::Command {
                error,
                netfn,
                cmd,
                completion_code,
                data,
            },
            IpmiError::Failed {
                netfn,
                cmd,
                completion_code,
                data,
            } => IpmiError::Failed {
                netfn,
                cmd,
                completion_code,
                data,
            },
            IpmiError::ParsingFailed {
                error,
                netfn,
                cmd,
                data,
            } => IpmiError::ParsingFailed {
                error,
                netfn,
                cmd,
                data,
            },
            IpmiError::Connection(e) => IpmiError::Connection(f(e)),
        }
    }
}

impl<CON: core::fmt::Debug, P: core::fmt::Debug> core::fmt::Display for IpmiError<CON, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpmiError::NetFnIsResponse(netfn) => {
                write!(f, "netfn {netfn:?} is a response netfn")
            }
            IpmiError::UnexpectedResponse {
                netfn_sent,
                netfn_recvd,
                cmd_sent,
                cmd_recvd,
            } => write!(
                f,
                "unexpected response: sent ({netfn_sent:?}, 0x{cmd_sent:02X}), got ({netfn_recvd:?}, 0x{cmd_recvd:02X})"
            ),
            IpmiError::Command {
                error,
                completion_code,
                ..
            } => write!(f, "command failed ({completion_code:?}): {error:?}"),
            IpmiError::Failed { completion_code, .. } => {
                write!(f, "command failed with completion code {completion_code:?}")
            }
            IpmiError::ParsingFailed { error, .. } => write!(f, "failed to parse response: {error:?}"),
            IpmiError::Connection(e) => write!(f, "connection error: {e:?}"),
        }
    }
}

impl<CON: core::fmt::Debug, P: core::fmt::Debug> std::error::Error for IpmiError<CON, P> {}
