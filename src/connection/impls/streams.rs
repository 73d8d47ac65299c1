use std::{
    ffi::{c_int, CString},
    io,
    os::fd::RawFd,
    time::{Duration, Instant},
};

use crate::connection::{IpmiConnection, Request, Response};

/// illumos' `/dev/bmc` STREAMS message types (`sys/bmc_intf.h`).
const BMC_MSG_REQUEST: u32 = 1;
const BMC_MSG_RESPONSE: u32 = 2;
const BMC_MSG_ERROR: u32 = 3;

/// Payload bytes that fit in a single fixed-size `bmc_req_t`; larger
/// requests grow the STREAMS message by the overflow, mirroring the
/// original driver's `offsetof(bmc_msg_t, msg) + sizeof(bmc_req_t)` sizing.
const SEND_MAX_PAYLOAD_SIZE: usize = 32;

/// `putmsg`/`getmsg` are not thread-safe on this device, so a stalled queue
/// is retried rather than failed immediately.
const QUEUE_WAIT: Duration = Duration::from_millis(1);
const QUEUE_MAX_TRIES: usize = 2000;

const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn encode_request(msg_id: u32, netfn: u8, lun: u8, cmd: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(11 + data.len());
    buf.extend_from_slice(&BMC_MSG_REQUEST.to_ne_bytes());
    buf.extend_from_slice(&msg_id.to_ne_bytes());
    buf.push((netfn << 2) | lun);
    buf.push(cmd);
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
    buf
}

struct DecodedMessage {
    msg_type: u32,
    msg_id: u32,
    ccode: u8,
    data: Vec<u8>,
}

fn decode_message(buf: &[u8]) -> Option<DecodedMessage> {
    if buf.len() < 8 {
        return None;
    }

    let msg_type = u32::from_ne_bytes(buf[0..4].try_into().ok()?);
    let msg_id = u32::from_ne_bytes(buf[4..8].try_into().ok()?);

    if msg_type == BMC_MSG_ERROR {
        let errno = buf.get(8).copied().unwrap_or(0);
        log::warn!("BMC STREAMS device reported errno {errno} for request {msg_id}");
        return Some(DecodedMessage {
            msg_type,
            msg_id,
            ccode: 0xFF,
            data: Vec::new(),
        });
    }

    let ccode = *buf.get(8)?;
    let data_len = *buf.get(9)? as usize;
    let data = buf.get(10..10 + data_len)?.to_vec();

    Some(DecodedMessage {
        msg_type,
        msg_id,
        ccode,
        data,
    })
}

#[repr(C)]
struct Strbuf {
    maxlen: c_int,
    len: c_int,
    buf: *mut libc::c_char,
}

/// Connection to illumos' STREAMS-based `/dev/bmc` driver. Unlike the Linux
/// ioctl interface, requests and responses are paired purely by the
/// sequence number this side assigns (`sys/bmc_intf.h`'s `m_id`); the
/// response carries no netfn/cmd of its own, so those are remembered here.
pub struct Streams {
    fd: RawFd,
    recv_timeout: Duration,
    next_msg_id: u32,
    last_sent: Option<(u8, u8)>,
}

impl Streams {
    pub fn new(path: impl AsRef<std::path::Path>, recv_timeout: Duration) -> io::Result<Self> {
        let path = CString::new(path.as_ref().to_string_lossy().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `path` is a valid, NUL-terminated C string owned by this
        // call; the returned fd is owned by `Self` from here on.
        let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_NONBLOCK) };

        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            fd,
            recv_timeout,
            next_msg_id: 0,
            last_sent: None,
        })
    }

    fn putmsg(&self, data: &mut [u8]) -> io::Result<()> {
        let mut sb = Strbuf {
            maxlen: data.len() as c_int,
            len: data.len() as c_int,
            buf: data.as_mut_ptr().cast(),
        };

        let mut tries = QUEUE_MAX_TRIES;
        loop {
            // SAFETY: `sb` points at `data`, which outlives this call.
            let res = unsafe { libc::putmsg(self.fd, std::ptr::null_mut(), &mut sb, 0) };

            if res >= 0 {
                return Ok(());
            }

            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock && tries > 0 {
                log::trace!("Message queue full - sleeping {}ms", QUEUE_WAIT.as_millis());
                tries -= 1;
                std::thread::sleep(QUEUE_WAIT);
                continue;
            }

            return Err(err);
        }
    }

    fn getmsg(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut sb = Strbuf {
            maxlen: buf.len() as c_int,
            len: 0,
            buf: buf.as_mut_ptr().cast(),
        };
        let mut flags: c_int = 0;

        // SAFETY: `sb` points at `buf`, which outlives this call.
        let res = unsafe { libc::getmsg(self.fd, std::ptr::null_mut(), &mut sb, &mut flags) };

        if res < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(sb.len.max(0) as usize)
    }

    fn recv_for(&mut self, expected_msg_id: u32) -> io::Result<Response> {
        let mut buf = vec![0u8; SEND_MAX_PAYLOAD_SIZE + 256];
        let start = Instant::now();

        loop {
            if start.elapsed() >= self.recv_timeout {
                return Err(io::Error::from(io::ErrorKind::TimedOut));
            }

            let len = match self.getmsg(&mut buf) {
                Ok(len) => len,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(QUEUE_WAIT);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let decoded = decode_message(&buf[..len]).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "truncated BMC STREAMS message")
            })?;

            if decoded.msg_type == BMC_MSG_ERROR {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!(
                        "BMC STREAMS driver reported an error for request {}",
                        decoded.msg_id
                    ),
                ));
            }

            if decoded.msg_type != BMC_MSG_RESPONSE {
                log::warn!(
                    "Unexpected msg type 0x{:02X} (message {}) - ignored",
                    decoded.msg_type,
                    decoded.msg_id
                );
                continue;
            }

            if decoded.msg_id != expected_msg_id {
                log::warn!(
                    "Fetched unexpected message {} != {expected_msg_id} - retrying",
                    decoded.msg_id
                );
                continue;
            }

            let (netfn_raw_request, cmd) = self
                .last_sent
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "response with no matching request"))?;

            let mut response_data = Vec::with_capacity(1 + decoded.data.len());
            response_data.push(decoded.ccode);
            response_data.extend_from_slice(&decoded.data);

            return Response::from_raw(
                netfn_raw_request | 1,
                cmd,
                decoded.msg_id as i64,
                &response_data,
            )
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed response"));
        }
    }
}

impl Drop for Streams {
    fn drop(&mut self) {
        // SAFETY: `fd` is owned by `Self` and not used after this point.
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl IpmiConnection for Streams {
    type SendError = io::Error;
    type RecvError = io::Error;
    type Error = io::Error;

    fn send(&mut self, request: &mut Request) -> io::Result<()> {
        let msg_id = self.next_msg_id;

        let netfn = request.netfn_raw();
        let cmd = request.cmd();
        let lun = request.lun().value();
        let data = request.data_mut();

        log::debug!(
            "Sending request {msg_id} (netfn: 0x{netfn:02X}, cmd: 0x{cmd:02X}, {} bytes)",
            data.len()
        );

        let mut encoded = encode_request(msg_id, netfn, lun, cmd, data);
        self.putmsg(&mut encoded)?;

        self.last_sent = Some((netfn, cmd));
        self.next_msg_id = msg_id.wrapping_add(1);

        Ok(())
    }

    fn recv(&mut self) -> io::Result<Response> {
        let expected_id = self.next_msg_id.wrapping_sub(1);
        self.recv_for(expected_id)
    }

    fn send_recv(&mut self, request: &mut Request) -> io::Result<Response> {
        let expected_id = self.next_msg_id;
        self.send(request)?;
        self.recv_for(expected_id)
    }
}
