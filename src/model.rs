//! Output of the aggregation pipeline.
//!
//! Field names serialize in the camelCase shape the dashboard views read.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::metric::Metric;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub price: Metric,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub probed_from: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    #[serde(rename = "livepeer_regions")]
    pub livepeer_regions: BTreeSet<String>,
    pub last_ping: Option<f64>,
    pub best_discovery_time: Metric,
    #[serde(rename = "avgRTR")]
    pub avg_rtr: Metric,
    #[serde(rename = "avgSR")]
    pub avg_sr: f64,
    pub normalized_price: Option<f64>,
    pub normalized_discovery_time: Option<f64>,
    #[serde(rename = "normalizedRTR")]
    pub normalized_rtr: Option<f64>,
}

impl Instance {
    pub fn has_known_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orchestrator {
    pub id: String,
    pub name: String,
    pub avg_price: Metric,
    pub avg_discovery_time: Metric,
    #[serde(rename = "avgRTR")]
    pub avg_rtr: Metric,
    #[serde(rename = "avgSR")]
    pub avg_sr: f64,
    pub instances: Vec<Instance>,
    pub best_price_by_region: BTreeMap<String, Metric>,
    pub best_discovery_time_by_region: BTreeMap<String, Metric>,
    #[serde(rename = "bestRTRByRegion")]
    pub best_rtr_by_region: BTreeMap<String, Metric>,
    pub normalized_price: Option<f64>,
    pub normalized_discovery_time: Option<f64>,
    #[serde(rename = "normalizedRTR")]
    pub normalized_rtr: Option<f64>,
}

/// Raw per-region accumulation, kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    pub total_avg_time: f64,
    pub total_price: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub median: Option<f64>,
    pub percentiles: Percentiles,
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub range: [f64; 2],
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSets {
    pub pricing: Vec<Bucket>,
    pub discovery_time: Vec<Bucket>,
    #[serde(rename = "performanceRTR")]
    pub performance_rtr: Vec<Bucket>,
    #[serde(rename = "performanceSR")]
    pub performance_sr: Vec<Bucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub pricing: Summary,
    pub discovery_time: Summary,
    #[serde(rename = "performanceRTR")]
    pub performance_rtr: Summary,
    #[serde(rename = "performanceSR")]
    pub performance_sr: Summary,
    pub buckets: BucketSets,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDataset {
    pub orchestrators: Vec<Orchestrator>,
    pub per_region_stats: BTreeMap<String, RegionStats>,
    pub aggregates: Aggregates,
    /// Instances removed because their location is unknown.
    pub dropped_instances: usize,
}

impl ProcessedDataset {
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.orchestrators.iter().flat_map(|o| o.instances.iter())
    }

    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }
}
