//! Per-sensor noise filtering.
//!
//! Motion sensors bounce: one physical movement often produces several
//! firings of the same sensor within a fraction of a second. The filter keeps
//! a firing only if it is the sensor's first, or if at least `threshold`
//! seconds have passed since that sensor's previously *retained* firing.
//! Different sensors never suppress each other.

use crate::core::seconds_between;
use crate::ingest::SensorEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Noise filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseFilterConfig {
    pub enabled: bool,
    /// Minimum gap between retained firings of one sensor (seconds)
    pub threshold_secs: f64,
}

impl Default for NoiseFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_secs: 1.0,
        }
    }
}

impl NoiseFilterConfig {
    /// A zero or negative threshold disables filtering.
    pub fn is_active(&self) -> bool {
        self.enabled && self.threshold_secs > 0.0
    }
}

/// Events that survived noise filtering, in global chronological order.
#[derive(Debug, Clone, Default)]
pub struct FilteredEvents {
    pub events: Vec<SensorEvent>,
    pub input_count: usize,
    pub removed: usize,
}

impl FilteredEvents {
    /// Share of input events removed, in percent.
    pub fn removed_pct(&self) -> f64 {
        if self.input_count == 0 {
            0.0
        } else {
            self.removed as f64 / self.input_count as f64 * 100.0
        }
    }
}

/// Filter rapid re-triggers out of a chronologically ordered stream.
///
/// Events are partitioned by sensor (by index, so order within a group is
/// global order), each group is scanned independently, and survivors are
/// merged back by original index.
pub fn filter_noise(events: &[SensorEvent], config: &NoiseFilterConfig) -> FilteredEvents {
    if !config.is_active() {
        return FilteredEvents {
            events: events.to_vec(),
            input_count: events.len(),
            removed: 0,
        };
    }

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, event) in events.iter().enumerate() {
        groups.entry(event.sensor_id.as_str()).or_default().push(idx);
    }

    let mut keep = vec![false; events.len()];
    for indices in groups.values() {
        let mut last_kept = None;
        for &idx in indices {
            let ts = events[idx].timestamp;
            let retain = match last_kept {
                None => true,
                Some(prev) => seconds_between(prev, ts) >= config.threshold_secs,
            };
            if retain {
                keep[idx] = true;
                last_kept = Some(ts);
            }
        }
    }

    let survivors: Vec<SensorEvent> = events
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(e, _)| e.clone())
        .collect();

    let filtered = FilteredEvents {
        removed: events.len() - survivors.len(),
        input_count: events.len(),
        events: survivors,
    };

    tracing::info!(
        threshold_secs = config.threshold_secs,
        removed = filtered.removed,
        "Removed {} rapid-fire events ({:.2}%)",
        filtered.removed,
        filtered.removed_pct()
    );

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_instant, SensorValue};
    use proptest::prelude::*;

    fn event(sensor: &str, time: &str) -> SensorEvent {
        SensorEvent::new(
            sensor,
            SensorValue::On,
            parse_instant(0, "2010-11-04", time).unwrap(),
        )
    }

    #[test]
    fn test_bounce_suppressed() {
        let events = vec![
            event("M1", "08:00:00"),
            event("M1", "08:00:00.5"),
            event("M2", "09:00:00"),
        ];
        let out = filter_noise(&events, &NoiseFilterConfig::default());
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.removed, 1);
        assert_eq!(out.events[1].sensor_id, "M2");
        assert!((out.removed_pct() - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let events = vec![event("M1", "08:00:00"), event("M1", "08:00:01")];
        let out = filter_noise(&events, &NoiseFilterConfig::default());
        assert_eq!(out.removed, 0);
    }

    #[test]
    fn test_gap_measured_from_retained_event() {
        // 0.6s steps: 0.0 kept, 0.6 dropped, 1.2 kept (1.2 from 0.0), 1.8 dropped
        let events = vec![
            event("M1", "08:00:00"),
            event("M1", "08:00:00.6"),
            event("M1", "08:00:01.2"),
            event("M1", "08:00:01.8"),
        ];
        let out = filter_noise(&events, &NoiseFilterConfig::default());
        let kept: Vec<_> = out.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(kept, vec![events[0].timestamp, events[2].timestamp]);
    }

    #[test]
    fn test_different_sensors_do_not_interact() {
        let events = vec![
            event("M1", "08:00:00"),
            event("M2", "08:00:00.1"),
            event("M1", "08:00:00.2"),
            event("M3", "08:00:00.3"),
        ];
        let out = filter_noise(&events, &NoiseFilterConfig::default());
        let sensors: Vec<&str> = out.events.iter().map(|e| e.sensor_id.as_str()).collect();
        assert_eq!(sensors, vec!["M1", "M2", "M3"]);
    }

    #[test]
    fn test_disabled_filter_keeps_everything() {
        let events = vec![event("M1", "08:00:00"), event("M1", "08:00:00.1")];
        for config in [
            NoiseFilterConfig {
                enabled: false,
                threshold_secs: 1.0,
            },
            NoiseFilterConfig {
                enabled: true,
                threshold_secs: 0.0,
            },
            NoiseFilterConfig {
                enabled: true,
                threshold_secs: -2.0,
            },
        ] {
            let out = filter_noise(&events, &config);
            assert_eq!(out.events.len(), 2);
            assert_eq!(out.removed, 0);
        }
    }

    #[test]
    fn test_empty_stream() {
        let out = filter_noise(&[], &NoiseFilterConfig::default());
        assert!(out.events.is_empty());
        assert_eq!(out.removed_pct(), 0.0);
    }

    fn arb_stream() -> impl Strategy<Value = Vec<SensorEvent>> {
        prop::collection::vec((0u8..4, 0i64..20_000), 0..60).prop_map(|raw| {
            let base = parse_instant(0, "2010-11-04", "08:00:00").unwrap();
            let mut events: Vec<SensorEvent> = raw
                .into_iter()
                .map(|(sensor, ms)| {
                    SensorEvent::new(
                        format!("M{sensor}"),
                        SensorValue::On,
                        base + chrono::Duration::milliseconds(ms),
                    )
                })
                .collect();
            events.sort_by_key(|e| e.timestamp);
            events
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(events in arb_stream(), threshold in 0.1f64..5.0) {
            let config = NoiseFilterConfig { enabled: true, threshold_secs: threshold };
            let once = filter_noise(&events, &config);
            let twice = filter_noise(&once.events, &config);
            prop_assert_eq!(twice.removed, 0);
            prop_assert_eq!(twice.events, once.events);
        }

        #[test]
        fn prop_output_stays_chronological(events in arb_stream()) {
            let out = filter_noise(&events, &NoiseFilterConfig::default());
            prop_assert!(out.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }
}
