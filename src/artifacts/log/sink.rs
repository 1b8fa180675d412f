//! Rendering sinks
//!
//! A sink is where rendered history bytes go. It accepts any number of
//! writes followed by exactly one close; the walker guarantees the close
//! happens on every exit path, so the underlying resource is never leaked.

use derive_new::new;
use std::io::{self, Write};

/// Destination for rendered history output
pub trait HistorySink {
    /// Append bytes to the sink
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Release the sink, flushing or displaying anything it buffered.
    ///
    /// Called exactly once, after the final write or the first failure.
    fn close(&mut self) -> io::Result<()>;
}

/// Sink backed by any `std::io::Write`
#[derive(new)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> HistorySink for WriterSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Sink backed by the minus pager
///
/// The pager collects pushed text and takes over the terminal when closed.
/// minus only accepts UTF-8 strings, so writes of other bytes are rejected
/// rather than mangled.
pub struct PagerSink {
    pager: minus::Pager,
}

impl PagerSink {
    pub fn new() -> Self {
        PagerSink {
            pager: minus::Pager::new(),
        }
    }
}

impl Default for PagerSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySink for PagerSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let text =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(text).map_err(io::Error::other)?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        minus::page_all(self.pager.clone()).map_err(io::Error::other)
    }
}
