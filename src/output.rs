use crate::error::{HumancamError, Result};
use std::io::Write;
use tracing::trace;

/// Line-framed frame output.
///
/// Every record is one payload followed by `\n`, flushed before `emit`
/// returns so a synchronous reader never waits on buffered data.
pub struct FrameEmitter<W: Write> {
    writer: W,
    records: u64,
    bytes: u64,
}

impl<W: Write> FrameEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records: 0,
            bytes: 0,
        }
    }

    /// Write one record and flush it
    pub fn emit(&mut self, payload: &str) -> Result<()> {
        self.writer
            .write_all(payload.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush())
            .map_err(HumancamError::Output)?;

        self.records += 1;
        self.bytes += payload.len() as u64 + 1;
        trace!("Emitted record {} ({} bytes)", self.records, payload.len());
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Writer that records how many flushes it has seen
    struct FlushCounter {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for FlushCounter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "consumer went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_records_are_newline_framed_and_flushed() {
        let mut emitter = FrameEmitter::new(FlushCounter {
            data: Vec::new(),
            flushes: 0,
        });

        emitter.emit("AAAA").unwrap();
        emitter.emit("BBBB").unwrap();

        assert_eq!(emitter.records(), 2);
        assert_eq!(emitter.bytes(), 10);

        let sink = emitter.into_inner();
        assert_eq!(sink.data, b"AAAA\nBBBB\n");
        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn test_write_failure_is_an_output_error() {
        let mut emitter = FrameEmitter::new(BrokenPipe);

        assert!(matches!(emitter.emit("AAAA"), Err(HumancamError::Output(_))));
        assert_eq!(emitter.records(), 0);
    }
}
