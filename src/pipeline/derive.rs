//! Per-instance derived fields.
//!
//! Uses only the instance itself plus its orchestrator's regional stats and
//! leaderboard results.

use crate::metric::Metric;
use crate::model::Instance;
use crate::raw::{RawInstance, RawOrchestrator};

/// `-1` (and anything non-finite) marks an unknown coordinate.
fn known_coordinate(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != -1.0)
}

pub fn derive_instance(id: &str, raw: &RawInstance, orch: &RawOrchestrator) -> Instance {
    let last_ping = raw
        .probed_from
        .values()
        .filter_map(|probe| probe.last_time.filter(|t| t.is_finite()))
        .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.max(t))));

    // RTR gates the region for both averages.
    let mut rtr_samples = Vec::new();
    let mut sr_samples = Vec::new();
    for region in &raw.livepeer_regions {
        let Some(entry) = orch.leaderboard_results.get(region) else {
            continue;
        };
        if let Metric::Valid(rtr) = Metric::positive(entry.latest_rtr) {
            rtr_samples.push(rtr);
            sr_samples.push(entry.latest_sr.filter(|v| v.is_finite()).unwrap_or(0.0));
        }
    }
    let avg_rtr = Metric::mean(&rtr_samples);
    let avg_sr = Metric::mean(&sr_samples).value().unwrap_or(0.0);

    let best_discovery_time = raw
        .probed_from
        .keys()
        .filter_map(|region| orch.regional_stats.get(region))
        .map(|stat| Metric::positive(stat.avg_discovery_time))
        .min_by(Metric::cmp_best)
        .unwrap_or(Metric::NoData);

    Instance {
        id: id.to_string(),
        price: Metric::non_negative(raw.price),
        latitude: known_coordinate(raw.latitude),
        longitude: known_coordinate(raw.longitude),
        probed_from: raw.probed_from.keys().cloned().collect(),
        regions: raw.regions.clone(),
        livepeer_regions: raw.livepeer_regions.clone(),
        last_ping,
        best_discovery_time,
        avg_rtr,
        avg_sr,
        normalized_price: None,
        normalized_discovery_time: None,
        normalized_rtr: None,
    }
}
