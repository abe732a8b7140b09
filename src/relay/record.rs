use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const KEY_TIMESTAMP: &str = "Timestamp";
pub const KEY_LEVEL: &str = "Level";
pub const KEY_PAYLOAD: &str = "Payload";
pub const KEY_FUNC: &str = "Func";

const STANDARD_KEYS: [&str; 4] = [KEY_TIMESTAMP, KEY_LEVEL, KEY_PAYLOAD, KEY_FUNC];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Error,
}

impl AsRef<str> for Severity {
    fn as_ref(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}

/// One relayed line, plus the label fields attached by the logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    pub payload: &'a str,
    pub func: Option<&'a str>,
    pub fields: &'a BTreeMap<String, String>,
}

impl LogRecord<'_> {
    /// Serializes the record as a single JSON line, newline included.
    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl Serialize for LogRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false);

        // Label fields never shadow the standard keys.
        let mut entries: BTreeMap<String, &str> = self
            .fields
            .iter()
            .map(|(key, value)| {
                if STANDARD_KEYS.contains(&key.as_str()) {
                    (format!("fields.{key}"), value.as_str())
                } else {
                    (key.clone(), value.as_str())
                }
            })
            .collect();
        entries.insert(KEY_TIMESTAMP.to_string(), &timestamp);
        entries.insert(KEY_LEVEL.to_string(), self.level.as_ref());
        entries.insert(KEY_PAYLOAD.to_string(), self.payload);
        entries.insert(KEY_FUNC.to_string(), self.func.unwrap_or_default());

        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
