//! String-keyed views over a processed dataset.
//!
//! The dashboard selects a KPI per view by name: distributions by
//! `"pricing"`-style keys, the ranking table by `"avgPrice"`-style keys and
//! map coloring by `"normalizedPrice"`-style keys.

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownKey;
use crate::metric::Metric;
use crate::model::{Aggregates, Bucket, Instance, Orchestrator, Summary};

macro_rules! string_keys {
    ($name:ident, $family:literal, { $($variant:ident => $key:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok($name::$variant),)+
                    _ => Err(UnknownKey { family: $family, key: s.to_string() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_keys!(DistributionKey, "distribution", {
    Pricing => "pricing",
    DiscoveryTime => "discoveryTime",
    PerformanceRtr => "performanceRTR",
    PerformanceSr => "performanceSR",
});

string_keys!(RankingKey, "ranking", {
    AvgPrice => "avgPrice",
    AvgDiscoveryTime => "avgDiscoveryTime",
    AvgRtr => "avgRTR",
    AvgSr => "avgSR",
});

string_keys!(MapKey, "map", {
    NormalizedPrice => "normalizedPrice",
    NormalizedDiscoveryTime => "normalizedDiscoveryTime",
    NormalizedRtr => "normalizedRTR",
});

// Dashboard tabs pick one key from each family.
string_keys!(Tab, "tab", {
    Pricing => "pricing",
    DiscoveryTime => "discovery-time",
    Performance => "performance",
});

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::Pricing => "Pricing",
            Tab::DiscoveryTime => "Discovery Time",
            Tab::Performance => "Performance",
        }
    }

    pub fn ranking_key(self) -> RankingKey {
        match self {
            Tab::Pricing => RankingKey::AvgPrice,
            Tab::DiscoveryTime => RankingKey::AvgDiscoveryTime,
            Tab::Performance => RankingKey::AvgRtr,
        }
    }

    pub fn map_key(self) -> MapKey {
        match self {
            Tab::Pricing => MapKey::NormalizedPrice,
            Tab::DiscoveryTime => MapKey::NormalizedDiscoveryTime,
            Tab::Performance => MapKey::NormalizedRtr,
        }
    }

    pub fn distribution_key(self) -> DistributionKey {
        match self {
            Tab::Pricing => DistributionKey::Pricing,
            Tab::DiscoveryTime => DistributionKey::DiscoveryTime,
            Tab::Performance => DistributionKey::PerformanceRtr,
        }
    }
}

impl Aggregates {
    pub fn summary(&self, key: DistributionKey) -> &Summary {
        match key {
            DistributionKey::Pricing => &self.pricing,
            DistributionKey::DiscoveryTime => &self.discovery_time,
            DistributionKey::PerformanceRtr => &self.performance_rtr,
            DistributionKey::PerformanceSr => &self.performance_sr,
        }
    }

    pub fn buckets(&self, key: DistributionKey) -> &[Bucket] {
        match key {
            DistributionKey::Pricing => &self.buckets.pricing,
            DistributionKey::DiscoveryTime => &self.buckets.discovery_time,
            DistributionKey::PerformanceRtr => &self.buckets.performance_rtr,
            DistributionKey::PerformanceSr => &self.buckets.performance_sr,
        }
    }
}

impl Orchestrator {
    pub fn ranking_value(&self, key: RankingKey) -> Metric {
        match key {
            RankingKey::AvgPrice => self.avg_price,
            RankingKey::AvgDiscoveryTime => self.avg_discovery_time,
            RankingKey::AvgRtr => self.avg_rtr,
            RankingKey::AvgSr => Metric::from(self.avg_sr),
        }
    }

    pub fn normalized(&self, key: MapKey) -> Option<f64> {
        match key {
            MapKey::NormalizedPrice => self.normalized_price,
            MapKey::NormalizedDiscoveryTime => self.normalized_discovery_time,
            MapKey::NormalizedRtr => self.normalized_rtr,
        }
    }
}

impl Instance {
    pub fn normalized(&self, key: MapKey) -> Option<f64> {
        match key {
            MapKey::NormalizedPrice => self.normalized_price,
            MapKey::NormalizedDiscoveryTime => self.normalized_discovery_time,
            MapKey::NormalizedRtr => self.normalized_rtr,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow<'a> {
    pub rank: usize,
    pub id: &'a str,
    pub name: &'a str,
    pub value: f64,
}

impl RankingRow<'_> {
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// Orchestrators with a usable, non-negative value, ascending; ties keep
/// payload order.
pub fn ranking(orchestrators: &[Orchestrator], key: RankingKey) -> Vec<RankingRow<'_>> {
    let mut rows: Vec<(&Orchestrator, f64)> = orchestrators
        .iter()
        .filter_map(|o| o.ranking_value(key).value().map(|v| (o, v)))
        .filter(|(_, v)| *v >= 0.0)
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    rows.into_iter()
        .enumerate()
        .map(|(i, (o, value))| RankingRow {
            rank: i + 1,
            id: &o.id,
            name: &o.name,
            value,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinColor {
    Gray,
    Rgb(u8, u8, u8),
}

impl PinColor {
    /// Red (score 0) through green (score 1); gray without a score.
    pub fn for_score(score: Option<f64>) -> Self {
        match score.filter(|s| s.is_finite()) {
            None => PinColor::Gray,
            Some(s) => {
                let s = s.clamp(0.0, 1.0);
                PinColor::Rgb((255.0 * (1.0 - s)).round() as u8, (255.0 * s).round() as u8, 0)
            }
        }
    }
}

impl fmt::Display for PinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinColor::Gray => f.write_str("gray"),
            PinColor::Rgb(r, g, b) => write!(f, "rgb({}, {}, {})", r, g, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{process_json, PipelineOptions};

    #[test]
    fn test_keys_round_trip_names() {
        assert_eq!("avgRTR".parse::<RankingKey>().unwrap(), RankingKey::AvgRtr);
        assert_eq!("performanceRTR".parse::<DistributionKey>().unwrap(), DistributionKey::PerformanceRtr);
        assert_eq!(MapKey::NormalizedDiscoveryTime.to_string(), "normalizedDiscoveryTime");
        assert_eq!(DistributionKey::ALL.len(), 4);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "avgLatency".parse::<RankingKey>().unwrap_err();
        assert_eq!(err.family, "ranking");
        assert_eq!(err.to_string(), "unknown ranking key \"avgLatency\"");
    }

    #[test]
    fn test_tab_mapping() {
        let tab: Tab = "discovery-time".parse().unwrap();
        assert_eq!(tab.ranking_key(), RankingKey::AvgDiscoveryTime);
        assert_eq!(tab.map_key(), MapKey::NormalizedDiscoveryTime);
        assert_eq!(tab.distribution_key(), DistributionKey::DiscoveryTime);
        assert_eq!(Tab::Performance.distribution_key(), DistributionKey::PerformanceRtr);
        assert_eq!(tab.title(), "Discovery Time");
    }

    #[test]
    fn test_ranking_skips_missing_and_sorts_ascending() {
        let body = br#"{
            "0xc": {"name": "gamma", "instances": {"i": {"price": 30, "latitude": 1, "longitude": 1}}},
            "0xa": {"name": "alpha", "instances": {"i": {"price": 10, "latitude": 1, "longitude": 1}}},
            "0xn": {"name": "none", "instances": {"i": {"latitude": 1, "longitude": 1}}},
            "0xb": {"name": "beta", "instances": {"i": {"price": 20, "latitude": 1, "longitude": 1}}}
        }"#;
        let ds = process_json(body, &PipelineOptions::default()).unwrap();
        let rows = ranking(&ds.orchestrators, RankingKey::AvgPrice);
        let names: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].display_value(), "30.00");
    }

    #[test]
    fn test_distribution_projection() {
        let body = br#"{"0xa": {"instances": {"i": {"price": 4, "latitude": 1, "longitude": 1}}}}"#;
        let ds = process_json(body, &PipelineOptions::default()).unwrap();
        let summary = ds.aggregates.summary(DistributionKey::Pricing);
        assert_eq!(summary.median, Some(4.0));
        assert_eq!(ds.aggregates.buckets(DistributionKey::Pricing).len(), 1);
        assert_eq!(ds.aggregates.buckets(DistributionKey::PerformanceSr).len(), 10);
        let inst = &ds.orchestrators[0].instances[0];
        assert_eq!(inst.normalized(MapKey::NormalizedPrice), Some(1.0));
        assert_eq!(inst.normalized(MapKey::NormalizedRtr), None);
    }

    #[test]
    fn test_pin_colors() {
        assert_eq!(PinColor::for_score(None), PinColor::Gray);
        assert_eq!(PinColor::for_score(Some(1.0)).to_string(), "rgb(0, 255, 0)");
        assert_eq!(PinColor::for_score(Some(0.0)).to_string(), "rgb(255, 0, 0)");
        assert_eq!(PinColor::for_score(Some(7.0)), PinColor::Rgb(0, 255, 0));
        assert_eq!(PinColor::for_score(Some(0.5)), PinColor::Rgb(128, 128, 0));
    }
}
