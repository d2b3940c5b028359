//! Message body streams.
//!
//! Two kinds of stream back a message body: a plain in-memory stream, and
//! an output-capture stream bound to a process-wide [`OutputSink`]. The
//! capture binding is queryable, which is what lets the lifecycle manager
//! swap in a fresh instance before each simulated call.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::output::OutputSink;

#[derive(Clone, Debug)]
enum StreamKind {
    Memory(Arc<Mutex<Vec<u8>>>),
    OutputCapture(OutputSink),
}

/// Readable/writable message body.
///
/// Clones share the underlying buffer (cheap `Arc` clone); each clone
/// keeps its own read position, starting at offset 0.
#[derive(Clone, Debug)]
pub struct BodyStream {
    kind: StreamKind,
    pos: usize,
}

impl BodyStream {
    /// Empty in-memory stream.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// In-memory stream pre-filled with `content`, positioned at offset 0.
    pub fn from_bytes(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            kind: StreamKind::Memory(Arc::new(Mutex::new(content.to_vec()))),
            pos: 0,
        }
    }

    /// Stream capturing whatever the application writes to the sink.
    pub fn output_capture(sink: OutputSink) -> Self {
        Self {
            kind: StreamKind::OutputCapture(sink),
            pos: 0,
        }
    }

    /// Whether this stream is bound to the process output sink.
    pub fn is_output_capture(&self) -> bool {
        matches!(self.kind, StreamKind::OutputCapture(_))
    }

    /// The sink this stream captures, if any.
    pub fn sink(&self) -> Option<&OutputSink> {
        match &self.kind {
            StreamKind::OutputCapture(sink) => Some(sink),
            StreamKind::Memory(_) => None,
        }
    }

    /// Produce a distinct stream of the same kind with no carried-over
    /// content. For capture streams the sink is cleared so output
    /// buffered by a previous call cannot leak into the next one.
    pub fn clone_fresh(&self) -> Self {
        match &self.kind {
            StreamKind::Memory(_) => Self::empty(),
            StreamKind::OutputCapture(sink) => {
                sink.clear();
                Self::output_capture(sink.clone())
            }
        }
    }

    /// Whether this stream and `other` share a buffer or sink.
    pub fn shares_buffer(&self, other: &BodyStream) -> bool {
        match (&self.kind, &other.kind) {
            (StreamKind::Memory(a), StreamKind::Memory(b)) => Arc::ptr_eq(a, b),
            (StreamKind::OutputCapture(a), StreamKind::OutputCapture(b)) => a.same_sink(b),
            _ => false,
        }
    }

    /// Materialize the full stream contents.
    pub fn contents(&self) -> Bytes {
        match &self.kind {
            StreamKind::Memory(buf) => Bytes::copy_from_slice(&buf.lock().unwrap()),
            StreamKind::OutputCapture(sink) => sink.contents(),
        }
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.contents().len()
    }

    /// Whether the stream holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BodyStream {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.contents()))
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let contents = self.contents();
        let remaining = &contents[self.pos.min(contents.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for BodyStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.kind {
            StreamKind::Memory(inner) => inner.lock().unwrap().extend_from_slice(buf),
            StreamKind::OutputCapture(sink) => sink.write(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stream_reads_from_offset_zero() {
        let mut stream = BodyStream::from_bytes("color=blue");
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "color=blue");
    }

    #[test]
    fn test_memory_stream_write_then_display() {
        let mut stream = BodyStream::empty();
        stream.write_all(b"mood=sunny").unwrap();
        assert_eq!(stream.to_string(), "mood=sunny");
        assert!(!stream.is_output_capture());
    }

    #[test]
    fn test_capture_stream_reads_sink() {
        let sink = OutputSink::new();
        let stream = BodyStream::output_capture(sink.clone());
        assert!(stream.is_output_capture());

        sink.write(b"buffered output");
        assert_eq!(stream.to_string(), "buffered output");
    }

    #[test]
    fn test_clone_fresh_drops_buffered_output() {
        let sink = OutputSink::new();
        let stream = BodyStream::output_capture(sink.clone());
        sink.write(b"from a previous call");

        let fresh = stream.clone_fresh();
        assert!(fresh.is_output_capture());
        assert!(fresh.shares_buffer(&stream));
        assert!(fresh.is_empty());
        assert!(stream.is_empty());
    }

    #[test]
    fn test_clones_share_memory_buffer() {
        let mut stream = BodyStream::empty();
        let clone = stream.clone();
        stream.write_all(b"shared").unwrap();

        assert!(clone.shares_buffer(&stream));
        assert_eq!(clone.to_string(), "shared");
    }
}
