//! Structured activity records for retries, rate-limit waits and failures.
//!
//! The core reports through [`ActivityLog`]:
//!
//! | Sink | Destination |
//! |------|-------------|
//! | [`TracingActivityLog`] | `tracing` events under `spotlink::activity` |
//! | [`JsonLinesActivityLog`] | one JSON object per line, appended to a file |
//! | [`MemoryActivityLog`] | in-memory, for inspection |
//! | [`FanoutActivityLog`] | every sink it holds |

use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl ActivityLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl Display for ActivityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    #[serde(rename = "ts", with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub level: ActivityLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl ActivityRecord {
    pub fn new(level: ActivityLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            level,
            message: message.into(),
            extra: None,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(ActivityLevel::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ActivityLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ActivityLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ActivityLevel::Error, message)
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn extra_value(&self, key: &str) -> Option<&Value> {
        self.extra.as_ref().and_then(|extra| extra.get(key))
    }
}

/// Sink for activity records. Called synchronously, before errors propagate.
pub trait ActivityLog: Send + Sync {
    fn record(&self, record: ActivityRecord);
}

/// Forwards records to `tracing` under the `spotlink::activity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn record(&self, record: ActivityRecord) {
        let extra = record
            .extra
            .as_ref()
            .map(|extra| Value::Object(extra.clone()).to_string())
            .unwrap_or_default();
        let message = record.message.as_str();

        match record.level {
            ActivityLevel::Debug => {
                tracing::debug!(target: "spotlink::activity", extra = %extra, "{message}")
            }
            ActivityLevel::Info => {
                tracing::info!(target: "spotlink::activity", extra = %extra, "{message}")
            }
            ActivityLevel::Warn => {
                tracing::warn!(target: "spotlink::activity", extra = %extra, "{message}")
            }
            ActivityLevel::Error => {
                tracing::error!(target: "spotlink::activity", extra = %extra, "{message}")
            }
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    records: Mutex<Vec<ActivityRecord>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn at_level(&self, level: ActivityLevel) -> Vec<ActivityRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .collect()
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record(&self, record: ActivityRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// Appends each record as one JSON line to a file.
///
/// The file is created if missing and never truncated. Write failures are
/// reported through `tracing` since `record` cannot fail.
#[derive(Debug)]
pub struct JsonLinesActivityLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesActivityLog {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back every record in the file at `path`, oldest first.
    ///
    /// A missing file has no records. Blank lines are skipped.
    pub fn read_records(path: impl AsRef<Path>) -> io::Result<Vec<Value>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
            .collect()
    }

    fn append(&self, record: &ActivityRecord) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
    }
}

impl ActivityLog for JsonLinesActivityLog {
    fn record(&self, record: ActivityRecord) {
        if let Err(error) = self.append(&record) {
            tracing::warn!(
                target: "spotlink::activity",
                path = %self.path.display(),
                "failed to append activity record: {error}"
            );
        }
    }
}

/// Hands every record to each inner sink, in order.
#[derive(Default, Clone)]
pub struct FanoutActivityLog {
    sinks: Vec<Arc<dyn ActivityLog>>,
}

impl FanoutActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ActivityLog>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ActivityLog for FanoutActivityLog {
    fn record(&self, record: ActivityRecord) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(record.clone());
            }
            last.record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_short_timestamp_key() {
        let record = ActivityRecord::warn("429 rate limited").with_extra("attempt", 1);
        let value = serde_json::to_value(&record).expect("record should serialize");

        assert!(value.get("ts").and_then(Value::as_str).is_some());
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["message"], "429 rate limited");
        assert_eq!(value["extra"]["attempt"], 1);
    }

    #[test]
    fn record_without_extra_omits_the_field() {
        let value = serde_json::to_value(ActivityRecord::info("fetched"))
            .expect("record should serialize");
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn memory_log_filters_by_level() {
        let log = MemoryActivityLog::new();
        log.record(ActivityRecord::warn("retrying"));
        log.record(ActivityRecord::error("gave up"));
        log.record(ActivityRecord::warn("retrying again"));

        assert_eq!(log.records().len(), 3);
        assert_eq!(log.at_level(ActivityLevel::Warn).len(), 2);
        assert_eq!(log.at_level(ActivityLevel::Error)[0].message, "gave up");
    }

    #[test]
    fn json_lines_log_appends_one_object_per_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("activity.log");
        let log = JsonLinesActivityLog::open(&path).expect("log opens");

        log.record(
            ActivityRecord::warn("429 rate limited on https://api.test. attempt=1. waiting 2s")
                .with_extra("attempt", 1)
                .with_extra("wait_secs", 2.0),
        );
        log.record(ActivityRecord::info("Fetched price for BTCUSDT"));

        let contents = std::fs::read_to_string(&path).expect("log readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(contents.ends_with('\n'));

        let first: Value = serde_json::from_str(lines[0]).expect("first line is JSON");
        assert_eq!(first["level"], "WARN");
        assert_eq!(first["extra"]["attempt"], 1);
        assert_eq!(first["extra"]["wait_secs"], 2.0);
        assert!(first["ts"].as_str().is_some_and(|ts| ts.contains('T')));

        let second: Value = serde_json::from_str(lines[1]).expect("second line is JSON");
        assert_eq!(second["message"], "Fetched price for BTCUSDT");
        assert!(second.get("extra").is_none());
    }

    #[test]
    fn json_lines_log_keeps_existing_lines_when_reopened() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("activity.log");

        JsonLinesActivityLog::open(&path)
            .expect("first open")
            .record(ActivityRecord::error("gave up"));
        JsonLinesActivityLog::open(&path)
            .expect("second open")
            .record(ActivityRecord::warn("retrying"));

        let records = JsonLinesActivityLog::read_records(&path).expect("records parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["message"], "gave up");
        assert_eq!(records[1]["level"], "WARN");
    }

    #[test]
    fn reading_a_missing_log_yields_no_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let records = JsonLinesActivityLog::read_records(dir.path().join("absent.log"))
            .expect("missing file is empty");
        assert!(records.is_empty());
    }

    #[test]
    fn reading_a_corrupt_line_is_invalid_data() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("activity.log");
        std::fs::write(&path, "{\"level\":\"INFO\"}\nnot json\n").expect("write");

        let error = JsonLinesActivityLog::read_records(&path).expect_err("corrupt line");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn fanout_delivers_to_every_sink() {
        let first = Arc::new(MemoryActivityLog::new());
        let second = Arc::new(MemoryActivityLog::new());
        let fanout = FanoutActivityLog::new()
            .with_sink(first.clone())
            .with_sink(second.clone());

        fanout.record(ActivityRecord::warn("retrying"));

        assert_eq!(fanout.len(), 2);
        assert_eq!(first.records().len(), 1);
        assert_eq!(second.records()[0].message, "retrying");
    }
}
