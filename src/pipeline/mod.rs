//! Raw payload -> processed dataset.
//!
//! Stages run in a fixed order because each consumes the previous one's
//! output: derive instances, drop unknown locations, aggregate per
//! orchestrator, normalize both populations, then build distributions.

pub mod aggregate;
pub mod derive;
pub mod distribution;
pub mod normalize;

use std::collections::BTreeMap;

use crate::error::LoadError;
use crate::logging::{log_distribution, log_dropped_instances, ProfileScope};
use crate::model::{Aggregates, BucketSets, Orchestrator, ProcessedDataset};
use crate::raw::RawPayload;

use aggregate::{accumulate_region_stats, aggregate_orchestrator};
use derive::derive_instance;
use distribution::{bucketize, summarize, DEFAULT_BUCKETS};
use normalize::{normalize_instances, normalize_population};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub bucket_count: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { bucket_count: DEFAULT_BUCKETS }
    }
}

/// Decode and process a payload body in one step.
pub fn process_json(body: &[u8], opts: &PipelineOptions) -> Result<ProcessedDataset, LoadError> {
    let payload = RawPayload::from_slice(body)?;
    Ok(process(&payload, opts))
}

pub fn process(payload: &RawPayload, opts: &PipelineOptions) -> ProcessedDataset {
    let _scope = ProfileScope::with_context(
        "pipeline",
        "process",
        &[("orchestrators", serde_json::json!(payload.orchestrators.len()))],
    );

    let mut orchestrators = Vec::with_capacity(payload.orchestrators.len());
    let mut per_region_stats = BTreeMap::new();
    let mut dropped_instances = 0usize;

    {
        let _stage = ProfileScope::new("pipeline", "derive_aggregate");
        for (id, raw) in payload.orchestrators.iter() {
            let mut instances = Vec::with_capacity(raw.instances.len());
            for (instance_id, raw_instance) in raw.instances.iter() {
                let inst = derive_instance(instance_id, raw_instance, raw);
                if inst.has_known_location() {
                    instances.push(inst);
                } else {
                    dropped_instances += 1;
                }
            }
            let orch = aggregate_orchestrator(id, raw, instances);
            accumulate_region_stats(&mut per_region_stats, raw, &orch);
            orchestrators.push(orch);
        }
    }
    if dropped_instances > 0 {
        log_dropped_instances(dropped_instances, payload.instance_count());
    }

    {
        let _stage = ProfileScope::new("pipeline", "normalize");
        normalize_population(&mut orchestrators);
        normalize_instances(&mut orchestrators);
    }

    let aggregates = {
        let _stage = ProfileScope::new("pipeline", "distribution");
        build_aggregates(&orchestrators, opts.bucket_count)
    };

    ProcessedDataset {
        orchestrators,
        per_region_stats,
        aggregates,
        dropped_instances,
    }
}

fn build_aggregates(orchestrators: &[Orchestrator], bucket_count: usize) -> Aggregates {
    let instances = || orchestrators.iter().flat_map(|o| o.instances.iter());

    let prices: Vec<f64> = instances().filter_map(|i| i.price.value()).collect();
    let discovery_times: Vec<f64> = orchestrators
        .iter()
        .filter_map(|o| o.avg_discovery_time.value())
        .collect();
    let rtr: Vec<f64> = instances().filter_map(|i| i.avg_rtr.value()).collect();
    let sr: Vec<f64> = instances()
        .filter(|i| i.avg_rtr.is_valid())
        .map(|i| i.avg_sr)
        .collect();

    for (key, samples) in [
        ("pricing", &prices),
        ("discoveryTime", &discovery_times),
        ("performanceRTR", &rtr),
        ("performanceSR", &sr),
    ] {
        log_distribution(key, samples.len(), bucket_count.max(1));
    }

    Aggregates {
        pricing: summarize(&prices),
        discovery_time: summarize(&discovery_times),
        performance_rtr: summarize(&rtr),
        performance_sr: summarize(&sr),
        buckets: BucketSets {
            pricing: bucketize(&prices, bucket_count),
            discovery_time: bucketize(&discovery_times, bucket_count),
            performance_rtr: bucketize(&rtr, bucket_count),
            performance_sr: bucketize(&sr, bucket_count),
        },
    }
}
