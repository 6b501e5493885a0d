//! Caller-owned destinations for telemetry events.
//!
//! Sinks are injected by the caller; the core never keeps a process-wide
//! buffer. Delivery to a telemetry backend is the transport's job.

use super::TelemetryEvent;
use crate::error::SqlFaultError;
use std::io::Write;

/// Receives sanitized telemetry events.
pub trait TelemetrySink {
    /// Accepts one event.
    ///
    /// # Errors
    /// Returns an error if the sink cannot take the event.
    fn submit(&mut self, event: TelemetryEvent) -> crate::Result<()>;

    /// Pushes buffered events downstream.
    ///
    /// # Errors
    /// Returns an error if the underlying writer fails.
    fn flush(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    fn submit(&mut self, event: TelemetryEvent) -> crate::Result<()> {
        (**self).submit(event)
    }

    fn flush(&mut self) -> crate::Result<()> {
        (**self).flush()
    }
}

/// Keeps events in memory, in submission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<TelemetryEvent>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Events received so far.
    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no event is held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes and returns every held event, e.g. to hand a batch to a transport.
    pub fn drain(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TelemetrySink for MemorySink {
    fn submit(&mut self, event: TelemetryEvent) -> crate::Result<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Writes each event as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of events written.
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn submit(&mut self, event: TelemetryEvent) -> crate::Result<()> {
        serde_json::to_writer(&mut self.writer, &event)
            .map_err(|e| SqlFaultError::serialization("Failed to serialize telemetry event", e))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| SqlFaultError::io("Failed to write telemetry event", e))?;
        self.written = self.written.saturating_add(1);
        tracing::trace!(code = event.code(), "telemetry event written");
        Ok(())
    }

    fn flush(&mut self) -> crate::Result<()> {
        self.writer
            .flush()
            .map_err(|e| SqlFaultError::io("Failed to flush telemetry sink", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizer::SensitiveLiteralSet;
    use crate::taxonomy::{ErrorKind, ErrorRecord};
    use crate::telemetry::build_event;
    use crate::trace::CapturedTrace;

    fn event(code: u32) -> TelemetryEvent {
        build_event(
            &ErrorRecord::new(ErrorKind::Operational, code, "connection reset"),
            &CapturedTrace::empty(),
            &SensitiveLiteralSet::new(),
        )
    }

    #[test]
    fn test_memory_sink_keeps_order_and_drains() {
        let mut sink = MemorySink::new();
        sink.submit(event(250_001)).unwrap();
        sink.submit(event(250_002)).unwrap();

        let batch = sink.drain();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].code(), 250_001);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.submit(event(250_001)).unwrap();
        sink.submit(event(250_003)).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["code"], 250_003);
        assert_eq!(second["kind"], "Operational");
        assert_eq!(second["reason"], "connection reset");
    }

    #[test]
    fn test_json_lines_sink_reports_io_errors() {
        struct BrokenWriter;

        impl Write for BrokenWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
        }

        let mut sink = JsonLinesSink::new(BrokenWriter);
        assert!(sink.submit(event(250_001)).is_err());
        assert!(matches!(sink.flush(), Err(SqlFaultError::Io { .. })));
        assert_eq!(sink.written(), 0);
    }
}
