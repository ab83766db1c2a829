//! Event sinks.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::fleet::FleetEvent;

/// Destination for fleet events.
pub trait EventSink {
    fn record(&mut self, event: &FleetEvent) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Logs each event through `tracing` on target `fleet_events`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &FleetEvent) -> Result<()> {
        tracing::info!(target: "fleet_events", tick = event.tick, "{}", event);
        Ok(())
    }
}

/// Appends `"<local time> - <message>"` lines to a file.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn record(&mut self, event: &FleetEvent) -> Result<()> {
        writeln!(self.writer, "{}", event.log_line())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<FleetEvent>,
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &FleetEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::EventKind;
    use crate::graph::VertexIdx;
    use crate::robot::RobotId;

    fn completed(ts: u64) -> FleetEvent {
        FleetEvent::new(
            3,
            ts,
            Some(RobotId(2)),
            EventKind::TaskCompleted {
                vertex: VertexIdx::new(5),
            },
        )
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("fleet.log");

        let mut sink = FileSink::create(&path).unwrap();
        sink.record(&completed(1000)).unwrap();
        sink.record(&completed(1050)).unwrap();
        sink.flush().unwrap();
        drop(sink);

        // Reopening appends
        let mut sink = FileSink::create(&path).unwrap();
        sink.record(&completed(2000)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                completed(1000).log_line(),
                completed(1050).log_line(),
                completed(2000).log_line(),
            ]
        );
        assert!(lines[1].ends_with(".050 - Robot 2 completed task at vertex 5"));
    }

    #[test]
    fn test_memory_and_tracing_sinks() {
        let mut memory = MemorySink::default();
        memory.record(&completed(1)).unwrap();
        assert_eq!(memory.events.len(), 1);

        let mut tracing_sink = TracingSink;
        assert!(tracing_sink.record(&completed(1)).is_ok());
        assert!(tracing_sink.flush().is_ok());
    }
}
