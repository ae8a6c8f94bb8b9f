//! Line-oriented record source.

use crate::ingest::types::{RawRecord, RecordError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Records read from a source, with the lines that could not be split.
#[derive(Debug, Clone, Default)]
pub struct RecordSource {
    pub records: Vec<RawRecord>,
    pub rejected: Vec<RecordError>,
}

impl RecordSource {
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }

    /// Number of data lines consumed (accepted and rejected).
    pub fn line_count(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Errors that stop reading altogether.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Read records from any buffered reader.
///
/// Blank lines are skipped and do not count toward `sample_size`. Lines that
/// are not valid UTF-8 are rejected like any other malformed line.
pub fn read_records<R: BufRead>(
    mut reader: R,
    sample_size: Option<usize>,
) -> Result<RecordSource, ReadError> {
    let mut source = RecordSource::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        if sample_size.is_some_and(|limit| source.line_count() >= limit) {
            break;
        }

        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ReadError::Line {
                line: line_no + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim_end_matches(['\n', '\r']),
            Err(_) => {
                source
                    .rejected
                    .push(RecordError::InvalidEncoding { line: line_no });
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }

        match RawRecord::parse_line(line_no, text) {
            Ok(record) => source.records.push(record),
            Err(e) => source.rejected.push(e),
        }
    }

    tracing::debug!(
        records = source.records.len(),
        rejected = source.rejected.len(),
        "read record source"
    );

    Ok(source)
}

/// Read records from a file on disk.
pub fn read_records_from_path(
    path: &Path,
    sample_size: Option<usize>,
) -> Result<RecordSource, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    match sample_size {
        Some(n) => tracing::info!("Loading {} rows from {:?}", n, path),
        None => tracing::info!("Loading all rows from {:?}", path),
    }

    read_records(BufReader::new(file), sample_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = "\
2010-11-04,00:03:50.209589,M003,ON
2010-11-04,00:03:57.399391,M003,OFF

2010-11-04,00:15:08.984841,T002
2010-11-04,00:30:19.185547,M003,ON
";

    #[test]
    fn test_read_records_skips_blank_and_rejects_short_lines() {
        let source = read_records(Cursor::new(SAMPLE), None).unwrap();
        assert_eq!(source.records.len(), 3);
        assert_eq!(source.rejected.len(), 1);
        assert_eq!(source.rejected[0].line(), 4);
        assert_eq!(source.records[2].line, 5);
    }

    #[test]
    fn test_sample_size_limits_lines() {
        let source = read_records(Cursor::new(SAMPLE), Some(2)).unwrap();
        assert_eq!(source.line_count(), 2);
        assert_eq!(source.records.len(), 2);
    }

    #[test]
    fn test_read_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = read_records_from_path(file.path(), None).unwrap();
        assert_eq!(source.records.len(), 3);
    }

    #[test]
    fn test_invalid_utf8_line_is_rejected() {
        let mut bytes = b"2010-11-04,08:00:00,M001,ON\n".to_vec();
        bytes.extend_from_slice(b"2010-11-04,08:00:01,M\xff02,ON\n");
        bytes.extend_from_slice(b"2010-11-04,08:00:02,M003,OFF\r\n");

        let source = read_records(Cursor::new(bytes), None).unwrap();
        assert_eq!(source.records.len(), 2);
        assert_eq!(source.records[1].value, "OFF");
        assert_eq!(
            source.rejected,
            vec![RecordError::InvalidEncoding { line: 2 }]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = read_records_from_path(Path::new("/nonexistent/aruba.csv"), None).unwrap_err();
        assert!(matches!(err, ReadError::Open { .. }));
    }
}
