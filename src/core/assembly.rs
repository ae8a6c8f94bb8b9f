//! Event log assembly and tabular export.

use crate::core::segmentation::CaseId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// ISO-8601 timestamp format used for export (fraction only when non-zero).
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A labeled event routed to a case, ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    pub case: Option<CaseId>,
    pub activity: String,
    pub timestamp: NaiveDateTime,
}

/// One row of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub case_id: String,
    pub activity: String,
    pub timestamp: NaiveDateTime,
}

/// One event inside a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEvent {
    pub activity: String,
    pub timestamp: NaiveDateTime,
}

/// A process instance: the events routed to one case id, in time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    pub events: Vec<CaseEvent>,
}

impl Case {
    /// Activity sequence with timestamps stripped.
    pub fn variant(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.activity.as_str()).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.events.first().map(|e| e.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Event that could not be placed in the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("event at {timestamp} has no case id")]
    MissingCase { timestamp: NaiveDateTime },

    #[error("event at {timestamp} in case {case_id} has no activity")]
    MissingActivity {
        case_id: String,
        timestamp: NaiveDateTime,
    },
}

/// The assembled event log, sorted by case then timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct AssembledLog {
    pub log: EventLog,
    pub rejected: Vec<AssemblyError>,
}

/// Sort routed events by `(case, timestamp)` and flatten them into rows.
///
/// Ordering uses the typed case id, so `_S2` sorts before `_S10`. The sort is
/// stable: events sharing a case and timestamp keep their stream order.
pub fn assemble(events: Vec<RoutedEvent>) -> AssembledLog {
    let mut rejected = Vec::new();
    let mut complete: Vec<(CaseId, RoutedEvent)> = Vec::with_capacity(events.len());

    for event in events {
        let Some(case) = event.case else {
            rejected.push(AssemblyError::MissingCase {
                timestamp: event.timestamp,
            });
            continue;
        };
        if event.activity.trim().is_empty() {
            rejected.push(AssemblyError::MissingActivity {
                case_id: case.to_string(),
                timestamp: event.timestamp,
            });
            continue;
        }
        complete.push((case, event));
    }

    complete.sort_by(|(ca, a), (cb, b)| ca.cmp(cb).then(a.timestamp.cmp(&b.timestamp)));

    let entries = complete
        .into_iter()
        .map(|(case, event)| EventLogEntry {
            case_id: case.to_string(),
            activity: event.activity,
            timestamp: event.timestamp,
        })
        .collect();

    if !rejected.is_empty() {
        tracing::warn!(incomplete = rejected.len(), "skipped incomplete events");
    }

    AssembledLog {
        log: EventLog { entries },
        rejected,
    }
}

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write event log: {0}")]
    Write(#[from] std::io::Error),
}

impl EventLog {
    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group entries into cases. Entries of a case are contiguous after assembly.
    pub fn cases(&self) -> Vec<Case> {
        let mut cases: Vec<Case> = Vec::new();
        for entry in &self.entries {
            let event = CaseEvent {
                activity: entry.activity.clone(),
                timestamp: entry.timestamp,
            };
            match cases.last_mut() {
                Some(case) if case.case_id == entry.case_id => case.events.push(event),
                _ => cases.push(Case {
                    case_id: entry.case_id.clone(),
                    events: vec![event],
                }),
            }
        }
        cases
    }

    pub fn case_count(&self) -> usize {
        self.entries
            .windows(2)
            .filter(|w| w[0].case_id != w[1].case_id)
            .count()
            + usize::from(!self.entries.is_empty())
    }

    /// Write the log as CSV with a `case_id,activity,timestamp` header.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        writeln!(writer, "case_id,activity,timestamp")?;
        for entry in &self.entries {
            writeln!(
                writer,
                "{},{},{}",
                csv_field(&entry.case_id),
                csv_field(&entry.activity),
                entry.timestamp.format(EXPORT_TIMESTAMP_FORMAT)
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export the log to a CSV file.
    pub fn export_csv(&self, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path).map_err(|source| ExportError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(BufWriter::new(file))?;
        tracing::info!(rows = self.entries.len(), "Event log exported to {:?}", path);
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_instant;
    use chrono::NaiveDate;

    fn routed(case: Option<CaseId>, activity: &str, time: &str) -> RoutedEvent {
        RoutedEvent {
            case,
            activity: activity.to_string(),
            timestamp: parse_instant(0, "2010-11-04", time).unwrap(),
        }
    }

    fn session(index: u64) -> Option<CaseId> {
        Some(CaseId::Session {
            date: NaiveDate::from_ymd_opt(2010, 11, 4).unwrap(),
            index,
        })
    }

    #[test]
    fn test_sorted_by_case_then_time() {
        let assembled = assemble(vec![
            routed(session(10), "M1_ON", "12:00:00"),
            routed(session(2), "M2_ON", "09:00:00"),
            routed(session(2), "M1_ON", "08:00:00"),
        ]);
        let ids: Vec<&str> = assembled
            .log
            .entries()
            .iter()
            .map(|e| e.case_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2010-11-04_S2", "2010-11-04_S2", "2010-11-04_S10"]);
        assert_eq!(assembled.log.entries()[0].activity, "M1_ON");
        assert_eq!(assembled.log.case_count(), 2);
    }

    #[test]
    fn test_incomplete_events_skipped() {
        let assembled = assemble(vec![
            routed(None, "M1_ON", "08:00:00"),
            routed(session(1), "  ", "08:00:01"),
            routed(session(1), "M2_ON", "08:00:02"),
        ]);
        assert_eq!(assembled.log.len(), 1);
        assert_eq!(assembled.rejected.len(), 2);
        assert!(matches!(assembled.rejected[0], AssemblyError::MissingCase { .. }));
    }

    #[test]
    fn test_cases_grouping() {
        let assembled = assemble(vec![
            routed(session(1), "A", "08:00:00"),
            routed(session(2), "C", "11:00:00"),
            routed(session(1), "B", "08:30:00"),
        ]);
        let cases = assembled.log.cases();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].variant(), vec!["A", "B"]);
        assert_eq!(cases[1].variant(), vec!["C"]);
        assert!(cases.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_write_csv() {
        let day = Some(CaseId::Daily(NaiveDate::from_ymd_opt(2010, 11, 4).unwrap()));
        let assembled = assemble(vec![
            routed(day, "M1_ON", "08:00:00"),
            routed(day, "M2,X_ON", "08:00:00.25"),
        ]);
        let mut out = Vec::new();
        assembled.log.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "case_id,activity,timestamp");
        assert_eq!(lines[1], "2010-11-04,M1_ON,2010-11-04T08:00:00");
        assert_eq!(lines[2], "2010-11-04,\"M2,X_ON\",2010-11-04T08:00:00.250");
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event_log.csv");
        let assembled = assemble(vec![routed(session(1), "M1_ON", "08:00:00")]);
        assembled.log.export_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_empty_log() {
        let assembled = assemble(Vec::new());
        assert!(assembled.log.is_empty());
        assert_eq!(assembled.log.case_count(), 0);
        assert!(assembled.log.cases().is_empty());
    }
}
