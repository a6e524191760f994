use std::io;
use std::net::TcpStream;

pub mod tcp_connect;

/// Final classification of one connection attempt. A discriminated
/// type rather than an errno sign convention, so callers can match on
/// "timed out" vs "refused" vs "local failure" structurally.
#[derive(Debug)]
pub enum Outcome {
    /// The endpoint accepted the connection. The stream is open,
    /// restored to blocking mode, and owned by the caller.
    Connected(TcpStream),
    /// The bounded wait elapsed before the handshake completed.
    TimedOut,
    /// The peer or network rejected the attempt (connection refused,
    /// no route, unreachable), synchronously or after the wait.
    Refused(io::Error),
    /// A local resource failed: socket open, mode flags, readiness
    /// wait, pending-error query, or an invalid timeout.
    ResourceError(io::Error),
}

/// What remains of an `Outcome` once its socket has been released;
/// this is what the driver records and reports.
#[derive(Debug)]
pub enum ProbeStatus {
    Open,
    TimedOut,
    Refused(io::Error),
    ResourceError(io::Error),
}

impl Outcome {
    /// Collapse into the reportable status, closing the connected
    /// stream if there is one.
    pub fn into_status(self) -> ProbeStatus {
        match self {
            Outcome::Connected(stream) => {
                drop(stream);
                ProbeStatus::Open
            }
            Outcome::TimedOut => ProbeStatus::TimedOut,
            Outcome::Refused(e) => ProbeStatus::Refused(e),
            Outcome::ResourceError(e) => ProbeStatus::ResourceError(e),
        }
    }
}

impl ProbeStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ProbeStatus::Open)
    }

    /// Status text for the report line: `ok` or the OS error message.
    pub fn report(&self) -> String {
        match self {
            ProbeStatus::Open => "ok".to_string(),
            ProbeStatus::TimedOut => {
                strip_os_error(&io::Error::from_raw_os_error(libc::ETIMEDOUT))
            }
            ProbeStatus::Refused(e) | ProbeStatus::ResourceError(e) => strip_os_error(e),
        }
    }
}

// io::Error renders OS errors as "Connection refused (os error 111)";
// report lines carry only the message part.
fn strip_os_error(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}
