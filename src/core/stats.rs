//! Statistics over an assembled event log.
//!
//! Every computation here is read-only and tolerates an empty log: counts
//! come back as zero and undefined quantities as `None`.

use crate::core::assembly::{Case, EventLog};
use crate::core::labeling::LabeledEvent;
use crate::core::seconds_between;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

/// Percentiles reported for case durations.
pub const DURATION_PERCENTILES: [u8; 6] = [25, 50, 75, 90, 95, 99];

/// Cumulative case coverage that the variant summary reports on.
pub const VARIANT_COVERAGE_TARGET_PCT: f64 = 80.0;

/// Weekday names in histogram order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Occurrences of one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFrequency {
    pub activity: String,
    pub count: usize,
    /// Share of all events (0-100)
    pub share_pct: f64,
}

/// One trace variant and the cases that follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub activities: Vec<String>,
    pub case_count: usize,
    /// Share of all cases (0-100)
    pub share_pct: f64,
}

impl VariantSummary {
    /// Render the first `max` activities as `a → b → …`.
    pub fn preview(&self, max: usize) -> String {
        let shown: Vec<&str> = self
            .activities
            .iter()
            .take(max)
            .map(String::as_str)
            .collect();
        let mut text = shown.join(" → ");
        if self.activities.len() > max {
            text.push_str(&format!(
                " ... ({} activities total)",
                self.activities.len()
            ));
        }
        text
    }
}

/// Trace variant analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantStats {
    pub case_count: usize,
    pub variant_count: usize,
    /// Variants per case; `None` for an empty log
    pub complexity: Option<f64>,
    /// Fewest top-ranked variants covering 80% of cases
    pub variants_for_target: Option<usize>,
    /// Cumulative coverage (0-100) after including each ranked variant
    pub coverage: Vec<f64>,
    /// Variants ranked by case count, ties in first-seen order
    pub variants: Vec<VariantSummary>,
}

/// A named percentile of case duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
    pub rank: u8,
    pub secs: f64,
}

/// Case duration (throughput time) summary in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStats {
    pub case_count: usize,
    pub mean_secs: Option<f64>,
    pub median_secs: Option<f64>,
    pub min_secs: Option<f64>,
    pub max_secs: Option<f64>,
    /// Sample standard deviation; needs at least two cases
    pub std_dev_secs: Option<f64>,
    pub percentiles: Vec<Percentile>,
}

impl ThroughputStats {
    pub fn percentile(&self, rank: u8) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| p.rank == rank)
            .map(|p| p.secs)
    }
}

/// Events per calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Event counts over time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalDistribution {
    pub by_hour: [usize; 24],
    /// Monday first
    pub by_weekday: [usize; 7],
    pub daily: Vec<DailyCount>,
}

/// Number of events per case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseLengthStats {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Everything the statistics engine reports for one log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogStatistics {
    pub total_events: usize,
    pub case_count: usize,
    pub activities: Vec<ActivityFrequency>,
    pub case_lengths: CaseLengthStats,
    pub variants: VariantStats,
    pub throughput: ThroughputStats,
    pub temporal: TemporalDistribution,
}

/// Profile of the preprocessed (filtered, labeled) event stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessProfile {
    pub event_count: usize,
    pub unique_sensors: usize,
    pub unique_activities: usize,
    pub time_span_secs: Option<f64>,
    /// Busiest sensors, most events first
    pub top_sensors: Vec<(String, usize)>,
}

/// Run every analysis over the log.
pub fn compute_statistics(log: &EventLog) -> LogStatistics {
    let cases = log.cases();

    LogStatistics {
        total_events: log.len(),
        case_count: cases.len(),
        activities: activity_frequency(log),
        case_lengths: case_lengths(&cases),
        variants: trace_variants(&cases),
        throughput: throughput(&cases),
        temporal: temporal_distribution(log),
    }
}

/// Count occurrences while remembering first-seen order, then rank.
fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        let count = counts.entry(key).or_insert_with(|| {
            order.push(key);
            0
        });
        *count += 1;
    }

    let mut ranked: Vec<(&str, usize)> = order.into_iter().map(|k| (k, counts[k])).collect();
    // stable: ties keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Activity counts and shares, most frequent first.
pub fn activity_frequency(log: &EventLog) -> Vec<ActivityFrequency> {
    let total = log.len();
    ranked_counts(log.entries().iter().map(|e| e.activity.as_str()))
        .into_iter()
        .map(|(activity, count)| ActivityFrequency {
            activity: activity.to_string(),
            count,
            share_pct: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Group cases by their activity sequence.
pub fn trace_variants(cases: &[Case]) -> VariantStats {
    let case_count = cases.len();
    if case_count == 0 {
        return VariantStats::default();
    }

    let mut order: Vec<Vec<&str>> = Vec::new();
    let mut counts: HashMap<Vec<&str>, usize> = HashMap::new();
    for case in cases {
        let variant = case.variant();
        if !counts.contains_key(&variant) {
            order.push(variant.clone());
        }
        *counts.entry(variant).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Vec<&str>, usize)> = order
        .into_iter()
        .map(|v| {
            let n = counts[&v];
            (v, n)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut coverage = Vec::with_capacity(ranked.len());
    let mut covered = 0usize;
    let mut variants_for_target = None;
    for (i, (_, n)) in ranked.iter().enumerate() {
        covered += n;
        let pct = covered as f64 / case_count as f64 * 100.0;
        if variants_for_target.is_none() && pct >= VARIANT_COVERAGE_TARGET_PCT {
            variants_for_target = Some(i + 1);
        }
        coverage.push(pct);
    }

    let variant_count = ranked.len();
    VariantStats {
        case_count,
        variant_count,
        complexity: Some(variant_count as f64 / case_count as f64),
        variants_for_target,
        coverage,
        variants: ranked
            .into_iter()
            .map(|(activities, n)| VariantSummary {
                activities: activities.into_iter().map(str::to_string).collect(),
                case_count: n,
                share_pct: n as f64 / case_count as f64 * 100.0,
            })
            .collect(),
    }
}

/// Per-case duration statistics.
pub fn throughput(cases: &[Case]) -> ThroughputStats {
    let mut durations: Vec<f64> = cases
        .iter()
        .filter_map(|c| Some(seconds_between(c.first_timestamp()?, c.last_timestamp()?)))
        .collect();

    if durations.is_empty() {
        return ThroughputStats::default();
    }
    durations.sort_by(f64::total_cmp);

    let std_dev = Statistics::std_dev(&durations);

    ThroughputStats {
        case_count: durations.len(),
        mean_secs: Some(Statistics::mean(&durations)),
        median_secs: quantile(&durations, 0.5),
        min_secs: Some(Statistics::min(&durations)),
        max_secs: Some(Statistics::max(&durations)),
        std_dev_secs: std_dev.is_finite().then_some(std_dev),
        percentiles: DURATION_PERCENTILES
            .iter()
            .filter_map(|&rank| {
                quantile(&durations, f64::from(rank) / 100.0).map(|secs| Percentile { rank, secs })
            })
            .collect(),
    }
}

/// Events per case.
pub fn case_lengths(cases: &[Case]) -> CaseLengthStats {
    let mut lengths: Vec<usize> = cases.iter().map(Case::len).collect();
    if lengths.is_empty() {
        return CaseLengthStats::default();
    }
    lengths.sort_unstable();

    let as_f64: Vec<f64> = lengths.iter().map(|&n| n as f64).collect();
    CaseLengthStats {
        min: lengths.first().copied(),
        max: lengths.last().copied(),
        mean: Some(Statistics::mean(&as_f64)),
        median: quantile(&as_f64, 0.5),
    }
}

/// Hour-of-day, weekday and per-date event counts.
pub fn temporal_distribution(log: &EventLog) -> TemporalDistribution {
    let mut dist = TemporalDistribution::default();
    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for entry in log.entries() {
        let ts = entry.timestamp;
        dist.by_hour[ts.hour() as usize] += 1;
        dist.by_weekday[ts.weekday().num_days_from_monday() as usize] += 1;
        *daily.entry(ts.date()).or_insert(0) += 1;
    }

    dist.daily = daily
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    dist
}

/// Summarize the preprocessed stream before case construction.
pub fn preprocess_profile(events: &[LabeledEvent], top_n: usize) -> PreprocessProfile {
    let sensors = ranked_counts(events.iter().map(|e| e.sensor_id.as_str()));
    let unique_activities = events
        .iter()
        .map(|e| e.activity.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let time_span_secs = match (events.first(), events.last()) {
        (Some(first), Some(last)) => Some(seconds_between(first.timestamp, last.timestamp)),
        _ => None,
    };

    PreprocessProfile {
        event_count: events.len(),
        unique_sensors: sensors.len(),
        unique_activities,
        time_span_secs,
        top_sensors: sensors
            .into_iter()
            .take(top_n)
            .map(|(s, n)| (s.to_string(), n))
            .collect(),
    }
}

/// Linear-interpolation quantile of sorted data (`q` in 0..=1).
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
