use super::NetFn;

/// A response frame: `{ ccode, data }` keyed by the message id that was
/// matched to produce it (§3 "Response frame").
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    msg_id: i64,
    netfn: u8,
    cmd: u8,
    /// `data[0]` is the completion code; the rest is the command payload.
    /// Both transport backends strip the completion code out of the raw
    /// wire bytes into `ccode` before constructing this type (§4.2).
    ccode: u8,
    data: Vec<u8>,
}

impl Response {
    /// Build a response from a raw payload whose first byte is the
    /// completion code. Returns `None` if `raw` is empty.
    pub fn from_raw(netfn: u8, cmd: u8, msg_id: i64, raw: &[u8]) -> Option<Self> {
        let (ccode, data) = raw.split_first()?;
        Some(Self {
            msg_id,
            netfn,
            cmd,
            ccode: *ccode,
            data: data.to_vec(),
        })
    }

    pub fn netfn(&self) -> NetFn {
        NetFn::from(self.netfn)
    }

    pub fn cmd(&self) -> u8 {
        self.cmd
    }

    pub fn msg_id(&self) -> i64 {
        self.msg_id
    }

    pub fn cc(&self) -> u8 {
        self.ccode
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
