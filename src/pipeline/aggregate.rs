//! Orchestrator-level rollups and best-by-region maps.

use std::collections::BTreeMap;

use crate::metric::Metric;
use crate::model::{Instance, Orchestrator, RegionStats};
use crate::raw::RawOrchestrator;

/// First sighting of a region seeds the entry with whatever the candidate is,
/// `NoData` included. Later sightings only replace it with a positive value
/// strictly below the current one.
pub fn offer_region_best(map: &mut BTreeMap<String, Metric>, region: &str, candidate: Metric) {
    match map.get_mut(region) {
        None => {
            map.insert(region.to_string(), candidate);
        }
        Some(current) => {
            if let Metric::Valid(v) = candidate {
                if v > 0.0 && candidate.cmp_best(current).is_lt() {
                    *current = candidate;
                }
            }
        }
    }
}

pub fn aggregate_orchestrator(id: &str, raw: &RawOrchestrator, instances: Vec<Instance>) -> Orchestrator {
    let prices: Vec<f64> = instances.iter().filter_map(|i| i.price.value()).collect();
    let discovery: Vec<f64> = instances
        .iter()
        .filter_map(|i| i.best_discovery_time.value())
        .filter(|v| *v > 0.0)
        .collect();

    let rtr: Vec<f64> = raw
        .leaderboard_results
        .values()
        .filter_map(|l| Metric::positive(l.latest_rtr).value())
        .collect();
    let sr: Vec<f64> = raw
        .leaderboard_results
        .values()
        .map(|l| l.latest_sr.filter(|v| v.is_finite()).unwrap_or(0.0))
        .collect();

    let mut best_price_by_region = BTreeMap::new();
    let mut best_discovery_time_by_region = BTreeMap::new();
    let mut best_rtr_by_region = BTreeMap::new();
    for inst in &instances {
        for region in &inst.probed_from {
            offer_region_best(&mut best_price_by_region, region, inst.price);
            let discovery_time = raw
                .regional_stats
                .get(region)
                .and_then(|s| s.avg_discovery_time)
                .map(Metric::from)
                .unwrap_or(Metric::NoData);
            offer_region_best(&mut best_discovery_time_by_region, region, discovery_time);
            let latest_rtr = raw
                .leaderboard_results
                .get(region)
                .and_then(|l| l.latest_rtr)
                .map(Metric::from)
                .unwrap_or(Metric::NoData);
            offer_region_best(&mut best_rtr_by_region, region, latest_rtr);
        }
    }

    Orchestrator {
        id: id.to_string(),
        name: raw.name.clone(),
        avg_price: Metric::mean(&prices),
        avg_discovery_time: Metric::mean(&discovery),
        avg_rtr: Metric::mean(&rtr),
        avg_sr: Metric::mean(&sr).value().unwrap_or(0.0),
        instances,
        best_price_by_region,
        best_discovery_time_by_region,
        best_rtr_by_region,
        normalized_price: None,
        normalized_discovery_time: None,
        normalized_rtr: None,
    }
}

/// Diagnostic accumulation over every orchestrator's regional stats.
pub fn accumulate_region_stats(
    stats: &mut BTreeMap<String, RegionStats>,
    raw: &RawOrchestrator,
    orch: &Orchestrator,
) {
    let price_sum: f64 = orch.instances.iter().filter_map(|i| i.price.value()).sum();
    for (region, stat) in &raw.regional_stats {
        let entry = stats.entry(region.clone()).or_default();
        entry.total_avg_time += stat.avg_discovery_time.filter(|v| v.is_finite()).unwrap_or(0.0);
        entry.total_price += price_sum;
        entry.count += 1;
    }
}
