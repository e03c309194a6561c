use std::error;
use std::fmt;
use std::io::{Error as IOError, ErrorKind};

/// Errors produced while framing, encoding/decoding, or exchanging PakBus
/// transactions with a datalogger.
#[derive(Debug)]
pub enum Error {
    /// A received frame's quoting was malformed or its trailing signature
    /// did not verify to zero.
    FrameCorrupt,
    /// A buffer underran, an `ASCIIZ` field had no terminating NUL, or an
    /// unknown type name was looked up in the primitive table.
    MalformedCodec(String),
    /// No reply matching the waited-for transaction arrived before the
    /// (possibly please-wait-extended) deadline.
    Timeout,
    /// The peer answered with a non-zero `RespCode`/`Outcome`.
    PeerError(i32),
    /// `collect_data` was asked for a table name absent from the supplied
    /// table definition.
    TableNotFound(String),
    /// `collect_data` could not resolve one or more requested field names
    /// against the table definition.
    FieldNotResolved(Vec<String>),
    /// The underlying transport failed to connect.
    Connect(String),
    /// A transport's internal mutex was poisoned by a panic in another
    /// thread while holding it.
    Lock,
    /// The underlying transport failed during an established session.
    TransportError(ErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrameCorrupt => write!(f, "frame corrupt: bad quoting or non-zero signature"),
            Error::MalformedCodec(reason) => write!(f, "malformed codec data: {}", reason),
            Error::Timeout => write!(f, "timed out waiting for transaction reply"),
            Error::PeerError(code) => write!(f, "peer returned error code {}", code),
            Error::TableNotFound(name) => write!(f, "table not found in table definition: {}", name),
            Error::FieldNotResolved(names) => {
                write!(f, "field names not resolved: {}", names.join(", "))
            }
            Error::Connect(s) => write!(f, "connection error: {}", s),
            Error::Lock => write!(f, "lock error: panicked while holding the transport mutex"),
            Error::TransportError(kind) => write!(f, "transport error: {:?}", kind),
        }
    }
}

impl From<IOError> for Error {
    fn from(e: IOError) -> Self {
        Error::TransportError(e.kind())
    }
}

// This is important for other errors to wrap this one.
impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
