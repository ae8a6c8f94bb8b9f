//! Human-readable analysis report.

use crate::core::stats::{LogStatistics, PreprocessProfile, DURATION_PERCENTILES, WEEKDAYS};
use std::fmt;

/// Width of the longest bar in the hour-of-day chart.
const BAR_WIDTH: usize = 50;

/// Activities shown in a variant preview.
const VARIANT_PREVIEW_LEN: usize = 5;

const SECS_PER_HOUR: f64 = 3600.0;

fn hours(secs: Option<f64>) -> String {
    match secs {
        Some(s) => format!("{:8.2} hours", s / SECS_PER_HOUR),
        None => "     n/a".to_string(),
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(60))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(60))
}

/// Preprocessing profile section of the report.
pub struct ProfileReport<'a>(pub &'a PreprocessProfile);

impl fmt::Display for ProfileReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.0;
        heading(f, "Preprocessing")?;
        writeln!(f, "  - Final dataset: {} events", profile.event_count)?;
        writeln!(f, "  - Unique sensors: {}", profile.unique_sensors)?;
        writeln!(f, "  - Unique activities: {}", profile.unique_activities)?;
        if let Some(span) = profile.time_span_secs {
            writeln!(f, "  - Time span: {:.2} hours", span / SECS_PER_HOUR)?;
        }
        if !profile.top_sensors.is_empty() {
            writeln!(f, "\nSensor Statistics:")?;
            for (sensor, count) in &profile.top_sensors {
                writeln!(f, "  {sensor:20}: {count:7} events")?;
            }
        }
        Ok(())
    }
}

/// Statistics sections of the report, listing at most `top_n` entries per table.
pub struct StatisticsReport<'a> {
    pub stats: &'a LogStatistics,
    pub top_n: usize,
}

impl StatisticsReport<'_> {
    fn write_overview(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        heading(f, "Event Log")?;
        writeln!(f, "  - Total events: {}", stats.total_events)?;
        writeln!(f, "  - Total cases: {}", stats.case_count)?;
        writeln!(f, "  - Unique activities: {}", stats.activities.len())?;

        let lengths = &stats.case_lengths;
        if let (Some(min), Some(max), Some(mean), Some(median)) =
            (lengths.min, lengths.max, lengths.mean, lengths.median)
        {
            writeln!(f, "\nCase Length Statistics:")?;
            writeln!(f, "  - Min: {min} events")?;
            writeln!(f, "  - Max: {max} events")?;
            writeln!(f, "  - Mean: {mean:.2} events")?;
            writeln!(f, "  - Median: {median:.2} events")?;
        }
        Ok(())
    }

    fn write_activities(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Activity Frequency")?;
        for (i, freq) in self.stats.activities.iter().take(self.top_n).enumerate() {
            writeln!(
                f,
                "{:2}. {:30}: {:7} ({:5.2}%)",
                i + 1,
                freq.activity,
                freq.count,
                freq.share_pct
            )?;
        }
        Ok(())
    }

    fn write_variants(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Trace Variants")?;
        let variants = &self.stats.variants;
        writeln!(f, "  - Total cases: {}", variants.case_count)?;
        writeln!(f, "  - Unique variants: {}", variants.variant_count)?;
        match variants.complexity {
            Some(c) => writeln!(f, "  - Process complexity: {c:.4}")?,
            None => writeln!(f, "  - Process complexity: n/a")?,
        }
        for (i, v) in variants.variants.iter().take(self.top_n.min(10)).enumerate() {
            writeln!(
                f,
                "{:2}. {:4} cases ({:5.2}%): {}",
                i + 1,
                v.case_count,
                v.share_pct,
                v.preview(VARIANT_PREVIEW_LEN)
            )?;
        }
        if let Some(n) = variants.variants_for_target {
            writeln!(f, "\n{n} variants cover 80% of all cases")?;
        }
        Ok(())
    }

    fn write_throughput(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Throughput Time")?;
        let t = &self.stats.throughput;
        writeln!(f, "  - Mean:   {}", hours(t.mean_secs))?;
        writeln!(f, "  - Median: {}", hours(t.median_secs))?;
        writeln!(f, "  - Min:    {}", hours(t.min_secs))?;
        writeln!(f, "  - Max:    {}", hours(t.max_secs))?;
        writeln!(f, "  - Std:    {}", hours(t.std_dev_secs))?;
        writeln!(f, "\nPercentiles:")?;
        for rank in DURATION_PERCENTILES {
            writeln!(f, "  - {rank:2}th: {}", hours(t.percentile(rank)))?;
        }
        Ok(())
    }

    fn write_temporal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Temporal Patterns")?;
        let temporal = &self.stats.temporal;
        let peak = temporal.by_hour.iter().copied().max().unwrap_or(0);
        for (hour, &count) in temporal.by_hour.iter().enumerate() {
            let len = if peak == 0 { 0 } else { count * BAR_WIDTH / peak };
            writeln!(
                f,
                "{hour:02}:00 - {hour:02}:59 | {} {count:6}",
                "█".repeat(len)
            )?;
        }
        writeln!(f)?;
        for (day, count) in WEEKDAYS.iter().zip(temporal.by_weekday) {
            writeln!(f, "  {day:10} {count:7}")?;
        }
        writeln!(f, "\n  Days with activity: {}", temporal.daily.len())
    }
}

impl fmt::Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_overview(f)?;
        self.write_activities(f)?;
        self.write_variants(f)?;
        self.write_throughput(f)?;
        self.write_temporal(f)
    }
}

/// Render the preprocessing profile.
pub fn render_profile(profile: &PreprocessProfile) -> String {
    ProfileReport(profile).to_string()
}

/// Render the full statistics report, listing at most `top_n` entries per table.
pub fn render_statistics(stats: &LogStatistics, top_n: usize) -> String {
    StatisticsReport { stats, top_n }.to_string()
}
