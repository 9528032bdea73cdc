use std::io::Write;
use std::sync::Mutex;

use anyhow::Result;

use crate::alert::engine::AlertEvent;
use crate::output::json::render_json_line;

pub trait AlertSink: Send + Sync {
    fn send(&self, event: &AlertEvent) -> Result<()>;
}

pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn send(&self, event: &AlertEvent) -> Result<()> {
        println!(
            "[{}] {} {} - {}",
            event.severity, event.kind, event.title, event.body
        );
        Ok(())
    }
}

pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> AlertSink for WriterSink<W> {
    fn send(&self, event: &AlertEvent) -> Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("alert writer mutex poisoned"))?;
        writeln!(guard, "{}", render_json_line(event)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertSink, WriterSink};
    use crate::alert::engine::AlertEvent;
    use crate::alert::rules::{AlertEventKind, AlertSeverity};

    #[test]
    fn writer_sink_emits_json_lines() {
        let sink = WriterSink::new(Vec::new());
        let event = AlertEvent {
            kind: AlertEventKind::PriceJump,
            severity: AlertSeverity::Critical,
            title: "Price jump on a".to_string(),
            body: "1000 -> 1600 cents".to_string(),
        };
        sink.send(&event).expect("send");
        sink.send(&event).expect("send");
        let out = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("\"severity\":\"critical\""));
    }
}
