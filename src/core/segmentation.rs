//! Case segmentation.
//!
//! Assigns every event of a chronologically ordered stream to exactly one
//! case. Two policies are available: one case per calendar day, or sessions
//! separated by idle gaps longer than a threshold.

use crate::config::ConfigError;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default idle gap that separates two sessions (2 hours).
pub const DEFAULT_SESSION_GAP_SECS: f64 = 7200.0;

/// Case construction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CaseStrategy {
    #[default]
    Daily,
    Session,
}

impl CaseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStrategy::Daily => "daily",
            CaseStrategy::Session => "session",
        }
    }
}

impl fmt::Display for CaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(CaseStrategy::Daily),
            "session" => Ok(CaseStrategy::Session),
            other => Err(ConfigError::UnknownSegmentationPolicy(other.to_string())),
        }
    }
}

impl TryFrom<String> for CaseStrategy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CaseStrategy> for String {
    fn from(value: CaseStrategy) -> Self {
        value.as_str().to_string()
    }
}

/// Identity of a case.
///
/// Rendered as `YYYY-MM-DD` for daily cases and `YYYY-MM-DD_S<n>` for
/// sessions, where the date is the session's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseId {
    Daily(NaiveDate),
    Session { date: NaiveDate, index: u64 },
}

impl CaseId {
    pub fn date(&self) -> NaiveDate {
        match self {
            CaseId::Daily(date) | CaseId::Session { date, .. } => *date,
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseId::Daily(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            CaseId::Session { date, index } => {
                write!(f, "{}_S{}", date.format(DATE_FORMAT), index)
            }
        }
    }
}

/// A configured segmentation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmenter {
    Daily,
    Session { gap: Duration },
}

impl Segmenter {
    /// Build a segmenter, validating the session gap when it is needed.
    pub fn new(strategy: CaseStrategy, session_gap_secs: f64) -> Result<Self, ConfigError> {
        match strategy {
            CaseStrategy::Daily => Ok(Segmenter::Daily),
            CaseStrategy::Session => {
                if !session_gap_secs.is_finite() || session_gap_secs <= 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "session_gap_seconds",
                        value: session_gap_secs.to_string(),
                    });
                }
                let micros = (session_gap_secs * 1_000_000.0).round() as i64;
                Ok(Segmenter::Session {
                    gap: Duration::microseconds(micros),
                })
            }
        }
    }

    pub fn strategy(&self) -> CaseStrategy {
        match self {
            Segmenter::Daily => CaseStrategy::Daily,
            Segmenter::Session { .. } => CaseStrategy::Session,
        }
    }

    /// Assign a case to every timestamp. Input must be chronologically sorted.
    pub fn assign(&self, timestamps: &[NaiveDateTime]) -> Vec<CaseId> {
        match self {
            Segmenter::Daily => timestamps.iter().map(|ts| CaseId::Daily(ts.date())).collect(),
            Segmenter::Session { gap } => {
                let mut tracker = SessionTracker::new(*gap);
                let cases: Vec<CaseId> = timestamps.iter().map(|&ts| tracker.process(ts)).collect();
                tracing::debug!(
                    sessions = tracker.sessions_started(),
                    gap_secs = gap.num_seconds(),
                    "detected sessions"
                );
                cases
            }
        }
    }
}

/// Streaming session boundary detection.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    gap: Duration,
    /// Timestamp of the last event seen
    last_event_time: Option<NaiveDateTime>,
    current: Option<CaseId>,
    sessions_started: u64,
}

impl SessionTracker {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            last_event_time: None,
            current: None,
            sessions_started: 0,
        }
    }

    /// Route one event and return the session it belongs to.
    pub fn process(&mut self, event_time: NaiveDateTime) -> CaseId {
        let is_new_session = if let Some(last_time) = self.last_event_time {
            event_time - last_time > self.gap
        } else {
            true // First event starts a session
        };

        let case = match self.current {
            Some(case) if !is_new_session => case,
            _ => {
                self.sessions_started += 1;
                let case = CaseId::Session {
                    date: event_time.date(),
                    index: self.sessions_started,
                };
                self.current = Some(case);
                case
            }
        };

        self.last_event_time = Some(event_time);
        case
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::seconds_between;
    use crate::ingest::parse_instant;
    use proptest::prelude::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        parse_instant(0, date, time).unwrap()
    }

    #[test]
    fn test_case_id_rendering() {
        let date = NaiveDate::from_ymd_opt(2010, 11, 4).unwrap();
        assert_eq!(CaseId::Daily(date).to_string(), "2010-11-04");
        assert_eq!(CaseId::Session { date, index: 12 }.to_string(), "2010-11-04_S12");
    }

    #[test]
    fn test_daily_assignment() {
        let ts = vec![
            at("2010-11-04", "23:59:59.9"),
            at("2010-11-05", "00:00:00"),
        ];
        let cases = Segmenter::Daily.assign(&ts);
        assert_eq!(cases[0].to_string(), "2010-11-04");
        assert_eq!(cases[1].to_string(), "2010-11-05");
    }

    #[test]
    fn test_session_split_on_long_gap() {
        let segmenter = Segmenter::new(CaseStrategy::Session, 7200.0).unwrap();
        let ts = vec![
            at("2010-11-04", "10:00:00"),
            at("2010-11-04", "11:00:00"),
            at("2010-11-04", "13:05:00"),
        ];
        let cases: Vec<String> = segmenter.assign(&ts).iter().map(|c| c.to_string()).collect();
        assert_eq!(cases, vec!["2010-11-04_S1", "2010-11-04_S1", "2010-11-04_S2"]);
    }

    #[test]
    fn test_session_gap_is_strict() {
        let segmenter = Segmenter::new(CaseStrategy::Session, 7200.0).unwrap();
        let ts = vec![at("2010-11-04", "10:00:00"), at("2010-11-04", "12:00:00")];
        let cases = segmenter.assign(&ts);
        assert_eq!(cases[0], cases[1]);
    }

    #[test]
    fn test_session_spans_midnight() {
        let segmenter = Segmenter::new(CaseStrategy::Session, 7200.0).unwrap();
        let ts = vec![at("2010-11-04", "23:30:00"), at("2010-11-05", "00:30:00")];
        let cases = segmenter.assign(&ts);
        assert_eq!(cases[1].to_string(), "2010-11-04_S1");
    }

    #[test]
    fn test_tracker_counts_sessions() {
        let mut tracker = SessionTracker::new(Duration::seconds(60));
        assert_eq!(tracker.sessions_started(), 0);
        tracker.process(at("2010-11-04", "10:00:00"));
        tracker.process(at("2010-11-04", "10:00:30"));
        tracker.process(at("2010-11-04", "10:05:00"));
        assert_eq!(tracker.sessions_started(), 2);
    }

    #[test]
    fn test_session_counter_is_global() {
        let segmenter = Segmenter::new(CaseStrategy::Session, 60.0).unwrap();
        let ts = vec![
            at("2010-11-04", "10:00:00"),
            at("2010-11-05", "10:00:00"),
            at("2010-11-05", "12:00:00"),
        ];
        let cases: Vec<String> = segmenter.assign(&ts).iter().map(|c| c.to_string()).collect();
        assert_eq!(cases, vec!["2010-11-04_S1", "2010-11-05_S2", "2010-11-05_S3"]);
    }

    #[test]
    fn test_invalid_session_gap() {
        for gap in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Segmenter::new(CaseStrategy::Session, gap),
                Err(ConfigError::InvalidParameter { .. })
            ));
        }
        // gap is irrelevant for daily cases
        assert_eq!(Segmenter::new(CaseStrategy::Daily, 0.0).unwrap(), Segmenter::Daily);
    }

    #[test]
    fn test_unknown_strategy() {
        let err = "weekly".parse::<CaseStrategy>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSegmentationPolicy(ref name) if name == "weekly"));
    }

    #[test]
    fn test_empty_stream() {
        let segmenter = Segmenter::new(CaseStrategy::Session, 7200.0).unwrap();
        assert!(segmenter.assign(&[]).is_empty());
    }

    fn arb_timestamps() -> impl Strategy<Value = Vec<NaiveDateTime>> {
        prop::collection::vec(0i64..400_000, 0..80).prop_map(|mut secs| {
            secs.sort_unstable();
            let base = at("2010-11-04", "00:00:00");
            secs.into_iter()
                .map(|s| base + Duration::seconds(s))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_daily_case_is_own_date(ts in arb_timestamps()) {
            let cases = Segmenter::Daily.assign(&ts);
            for (t, case) in ts.iter().zip(&cases) {
                prop_assert_eq!(case.to_string(), t.format("%Y-%m-%d").to_string());
            }
        }

        #[test]
        fn prop_session_boundaries_follow_gap(ts in arb_timestamps(), gap in 1.0f64..20_000.0) {
            let segmenter = Segmenter::new(CaseStrategy::Session, gap.round()).unwrap();
            let cases = segmenter.assign(&ts);
            if let Some(first) = cases.first() {
                let starts_at_one = matches!(first, CaseId::Session { index: 1, .. });
                prop_assert!(starts_at_one);
            }
            for i in 1..ts.len() {
                let delta = seconds_between(ts[i - 1], ts[i]);
                if cases[i] == cases[i - 1] {
                    prop_assert!(delta <= gap.round());
                } else {
                    prop_assert!(delta > gap.round());
                }
            }
        }
    }
}
