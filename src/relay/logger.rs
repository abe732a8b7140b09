use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Mutex;

use chrono::Local;

use super::record::{LogRecord, Severity};
use super::sink::{BestEffortSink, SinkError, UdpSink};
use crate::config::RelayConfig;

/// Structured logger that relays every record to a best-effort sink and
/// mirrors it to a local output destination.
///
/// Safe to share between pumps: the sink is fire-and-forget and writes to
/// the output are serialized behind a mutex.
pub struct RelayLogger {
    sink: Box<dyn BestEffortSink>,
    output: Mutex<Box<dyn Write + Send>>,
    fields: BTreeMap<String, String>,
}

impl std::fmt::Debug for RelayLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayLogger")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Picks the allow-listed labels present on the container.
pub fn label_fields(
    allow_list: &[String],
    labels: &HashMap<String, String>,
) -> BTreeMap<String, String> {
    allow_list
        .iter()
        .filter_map(|key| labels.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}

/// Builds the relay logger for one container session. Fails only when the
/// UDP sink cannot be set up.
pub async fn configure_log_relay(
    config: &RelayConfig,
    labels: &HashMap<String, String>,
    output: Box<dyn Write + Send>,
) -> Result<RelayLogger, SinkError> {
    let sink = UdpSink::connect(&config.syslog_addr).await?;
    log::debug!("Relaying container logs to syslog at {}", sink.peer());
    let fields = label_fields(&config.send_docker_labels, labels);
    Ok(RelayLogger::new(sink, output, fields))
}

impl RelayLogger {
    pub fn new(
        sink: impl BestEffortSink + 'static,
        output: Box<dyn Write + Send>,
        fields: BTreeMap<String, String>,
    ) -> Self {
        Self {
            sink: Box::new(sink),
            output: Mutex::new(output),
            fields,
        }
    }

    pub fn log(&self, level: Severity, func: Option<&str>, payload: &str) {
        let record = LogRecord {
            timestamp: Local::now(),
            level,
            payload,
            func,
            fields: &self.fields,
        };
        let line = match record.to_line() {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to serialize relayed record: {e}");
                return;
            }
        };

        self.sink.deliver(&line);

        let mut output = match self.output.lock() {
            Ok(output) => output,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = output.write_all(&line).and_then(|_| output.flush()) {
            log::warn!("Failed to write relayed record to output: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Arc;

    /// Captures every delivered datagram.
    #[derive(Clone, Default)]
    pub struct MemorySink {
        pub records: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl BestEffortSink for MemorySink {
        fn deliver(&self, record: &[u8]) {
            self.records.lock().unwrap().push(record.to_vec());
        }
    }

    impl MemorySink {
        pub fn values(&self) -> Vec<serde_json::Value> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| serde_json::from_slice(r).expect("record is not JSON"))
                .collect()
        }
    }

    /// Output destination that can be inspected after the fact.
    #[derive(Clone, Default)]
    pub struct SharedBuffer {
        pub bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        pub fn contents(&self) -> Vec<u8> {
            self.bytes.lock().unwrap().clone()
        }
    }

    pub fn memory_logger(
        fields: BTreeMap<String, String>,
    ) -> (RelayLogger, MemorySink, SharedBuffer) {
        let sink = MemorySink::default();
        let output = SharedBuffer::default();
        let logger = RelayLogger::new(sink.clone(), Box::new(output.clone()), fields);
        (logger, sink, output)
    }
}
