//! End-to-end tests: raw sensor file in, event log CSV out.

use casas_eventlog::config::Config;
use casas_eventlog::core::{ActivityPolicy, CaseStrategy};
use casas_eventlog::pipeline::Pipeline;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn sensor_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

const DAY_TRACE: &[&str] = &[
    "2010-11-04,08:00:00,M001,ON",
    "2010-11-04,08:00:00.5,M001,ON",
    "2010-11-04,08:00:03,M002,ON",
    "2010-11-04,08:01:00,M001,OFF",
    "2010-11-05,07:30:00,M003,ON",
    "2010-11-05,07:45:10,M003,OFF",
    "2010-11-05,12:15:00,D001,OPEN",
];

#[test]
fn test_build_daily_log_from_file() {
    let input = sensor_file(DAY_TRACE);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    assert_eq!(out.summary.input_records, 7);
    assert_eq!(out.summary.noise_removed, 1);
    assert_eq!(out.log.len(), 6);
    assert_eq!(out.statistics.case_count, 2);

    let cases = out.log.cases();
    assert_eq!(cases[0].case_id, "2010-11-04");
    assert_eq!(cases[0].variant(), vec!["M001_ON", "M002_ON", "M001_OFF"]);
    assert_eq!(cases[1].case_id, "2010-11-05");
    assert_eq!(cases[1].variant(), vec!["M003_ON", "M003_OFF", "D001_OPEN"]);
}

#[test]
fn test_cases_are_contiguous_and_time_ordered() {
    let input = sensor_file(&[
        "2010-11-05,09:00:00,M2,ON",
        "2010-11-04,10:00:00,M1,ON",
        "2010-11-04,09:00:00,M1,OFF",
        "2010-11-05,08:00:00,M2,OFF",
    ]);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    let entries = out.log.entries();
    for pair in entries.windows(2) {
        assert!(pair[0].case_id <= pair[1].case_id);
        if pair[0].case_id == pair[1].case_id {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
    assert_eq!(out.log.case_count(), 2);
}

#[test]
fn test_session_strategy_with_binary_labels() {
    let input = sensor_file(&[
        "2010-11-04,10:00:00,M1,ON",
        "2010-11-04,11:00:00,M1,OFF",
        "2010-11-04,13:05:00,M2,ON",
        "2010-11-04,13:06:00,M2,OFF",
    ]);
    let config = Config {
        case_strategy: CaseStrategy::Session,
        activity_policy: ActivityPolicy::Binary,
        ..Config::default()
    };
    let out = Pipeline::new(config).unwrap().run_path(input.path()).unwrap();

    let cases = out.log.cases();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].case_id, "2010-11-04_S1");
    assert_eq!(cases[0].variant(), vec!["M1_Activate", "M1_Deactivate"]);
    assert_eq!(cases[1].case_id, "2010-11-04_S2");
    assert_eq!(out.statistics.throughput.case_count, 2);
}

#[test]
fn test_malformed_lines_are_reported() {
    let input = sensor_file(&[
        "2010-11-04,08:00:00,M1,ON",
        "not a record",
        "2010-13-40,08:00:00,M1,ON",
        "",
        "2010-11-04,08:10:00,M1,OFF",
    ]);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    assert_eq!(out.log.len(), 2);
    assert_eq!(out.summary.drops.malformed_record, 2);
    assert_eq!(out.summary.drop_samples.len(), 2);
}

#[test]
fn test_sample_size_limits_input() {
    let input = sensor_file(DAY_TRACE);
    let config = Config {
        sample_size: Some(3),
        ..Config::default()
    };
    let out = Pipeline::new(config).unwrap().run_path(input.path()).unwrap();

    assert_eq!(out.summary.input_records, 3);
    assert_eq!(out.statistics.case_count, 1);
}

#[test]
fn test_export_csv_round_trip_layout() {
    let input = sensor_file(DAY_TRACE);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event_log.csv");
    out.log.export_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "case_id,activity,timestamp");
    assert_eq!(lines.len(), out.log.len() + 1);
    assert!(lines[1].starts_with("2010-11-04,M001_ON,2010-11-04T08:00:00"));
}

#[test]
fn test_summary_file_is_written() {
    let input = sensor_file(DAY_TRACE);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("summary.json");
    out.summary.save(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["cases"], 2);
    assert_eq!(value["noise_removed"], 1);
}

#[test]
fn test_empty_file_yields_empty_log() {
    let input = sensor_file(&[]);
    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(input.path())
        .unwrap();

    assert!(out.log.is_empty());
    assert_eq!(out.statistics.variants.complexity, None);
    assert_eq!(out.statistics.throughput.mean_secs, None);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = Pipeline::new(Config::default())
        .unwrap()
        .run_path(&dir.path().join("missing.csv"));
    assert!(result.is_err());
}

#[test]
fn test_undecodable_line_is_dropped_not_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"2010-11-04,08:00:00,M001,ON\n").unwrap();
    file.write_all(b"2010-11-04,08:00:05,M\xff02,ON\n").unwrap();
    file.write_all(b"2010-11-04,08:00:09,M001,OFF\n").unwrap();
    file.flush().unwrap();

    let out = Pipeline::new(Config::default())
        .unwrap()
        .run_path(file.path())
        .unwrap();

    assert_eq!(out.log.len(), 2);
    assert_eq!(out.summary.drops.malformed_record, 1);
    assert_eq!(out.summary.input_records, 3);
}
