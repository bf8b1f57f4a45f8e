//! Timestamped agent log output.
//!
//! Every message goes through `tracing`. The installed subscriber writes one
//! line per event to stdout, prefixed with a `ctime`-style timestamp, and
//! passes the finished bytes through a [`LogEncoding`] on the way out. On
//! ASCII platforms the encoding is the identity; on EBCDIC consoles
//! (`logEncoding=ebcdic`) the line is converted to IBM-1047 before it is
//! written.

use chrono::Local;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// `ctime(3)` layout, e.g. `Mon Oct 19 09:41:07 2026`.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Text codec applied to log output at the write boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogEncoding {
    #[default]
    Utf8,
    Ebcdic,
}

impl LogEncoding {
    /// Parses the `logEncoding` agent option value.
    pub fn from_option(value: &str) -> Option<Self> {
        match value {
            "utf8" => Some(LogEncoding::Utf8),
            "ebcdic" => Some(LogEncoding::Ebcdic),
            _ => None,
        }
    }

    pub fn encode(self, bytes: &[u8]) -> Cow<'_, [u8]> {
        match self {
            LogEncoding::Utf8 => Cow::Borrowed(bytes),
            LogEncoding::Ebcdic => Cow::Owned(bytes.iter().map(|&b| ascii_to_ibm1047(b)).collect()),
        }
    }
}

const EBCDIC_SUB: u8 = 0x3F;

#[rustfmt::skip]
static ASCII_TO_IBM1047: [u8; 128] = [
    0x00, 0x01, 0x02, 0x03, 0x37, 0x2D, 0x2E, 0x2F, 0x16, 0x05, 0x15, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    0x10, 0x11, 0x12, 0x13, 0x3C, 0x3D, 0x32, 0x26, 0x18, 0x19, 0x3F, 0x27, 0x1C, 0x1D, 0x1E, 0x1F,
    0x40, 0x5A, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D, 0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F,
    0x7C, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6,
    0xD7, 0xD8, 0xD9, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xAD, 0xE0, 0xBD, 0x5F, 0x6D,
    0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96,
    0x97, 0x98, 0x99, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xC0, 0x4F, 0xD0, 0xA1, 0x07,
];

// Bytes outside 7-bit ASCII become the EBCDIC substitute character.
fn ascii_to_ibm1047(byte: u8) -> u8 {
    ASCII_TO_IBM1047.get(byte as usize).copied().unwrap_or(EBCDIC_SUB)
}

/// Local wall-clock timestamp in [`CTIME_FORMAT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CtimeTimer;

impl FormatTime for CtimeTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format(CTIME_FORMAT))
    }
}

/// `MakeWriter` adapter that runs every write through a [`LogEncoding`].
#[derive(Debug, Clone)]
pub struct Encoded<M> {
    inner: M,
    encoding: LogEncoding,
}

impl<M> Encoded<M> {
    pub fn new(inner: M, encoding: LogEncoding) -> Self {
        Encoded { inner, encoding }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for Encoded<M> {
    type Writer = EncodedWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        EncodedWriter {
            inner: self.inner.make_writer(),
            encoding: self.encoding,
        }
    }
}

pub struct EncodedWriter<W> {
    inner: W,
    encoding: LogEncoding,
}

impl<W: Write> Write for EncodedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoding {
            LogEncoding::Utf8 => self.inner.write(buf),
            encoding => {
                self.inner.write_all(&encoding.encode(buf))?;
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Builds the agent's subscriber over an arbitrary writer.
pub fn subscriber<M>(make_writer: M, encoding: LogEncoding) -> impl tracing::Subscriber + Send + Sync
where
    M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(Encoded::new(make_writer, encoding))
        .with_timer(CtimeTimer)
        .with_ansi(false)
        .with_target(false)
        .finish()
}

/// Installs the stdout subscriber. Keeps an existing global subscriber if
/// the host process already set one.
pub fn init(encoding: LogEncoding) {
    let _ = tracing::subscriber::set_global_default(subscriber(io::stdout, encoding));
}
