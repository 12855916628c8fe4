//! End-to-end properties of the aggregation pipeline.
//!
//! Each test feeds a JSON body through `process_json` and checks the
//! processed dataset the dashboard views would read.
//!
//! Test categories:
//!   1. Price validity       -- missing/negative prices never reach a mean
//!   2. Empty orchestrators  -- explicit no-data, no NaN
//!   3. Degenerate bounds    -- constant populations score 1
//!   4. Bucketing            -- counts add up, max in the last bucket
//!   5. Percentiles          -- direct index pick
//!   6. Location filter      -- unknown locations dropped
//!   7. Region best          -- lowest price per probed region

use orchscope::metric::Metric;
use orchscope::model::ProcessedDataset;
use orchscope::pipeline::distribution::{bucketize, summarize};
use orchscope::pipeline::{process_json, PipelineOptions};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run(payload: Value) -> ProcessedDataset {
    let body = serde_json::to_vec(&payload).unwrap();
    process_json(&body, &PipelineOptions::default()).expect("pipeline failed")
}

/// Instance at a fixed known location.
fn located(extra: Value) -> Value {
    let mut inst = json!({"latitude": 52.378, "longitude": 4.9});
    if let (Some(obj), Value::Object(more)) = (inst.as_object_mut(), extra) {
        obj.extend(more);
    }
    inst
}

// ===========================================================================
// 1. Price validity
// ===========================================================================

#[test]
fn invalid_prices_excluded_from_every_mean() {
    let ds = run(json!({
        "0xa": {"name": "a", "instances": {
            "missing": located(json!({})),
            "negative": located(json!({"price": -3})),
            "text": located(json!({"price": "12"})),
            "good": located(json!({"price": 8}))
        }}
    }));
    let orch = &ds.orchestrators[0];
    assert_eq!(orch.avg_price, Metric::Valid(8.0));
    assert_eq!(orch.instances[1].price, Metric::NoData);
    assert_eq!(orch.instances[1].normalized_price, None);
    assert_eq!(ds.aggregates.pricing.range, Some([8.0, 8.0]));
    let counted: usize = ds.aggregates.buckets.pricing.iter().map(|b| b.count).sum();
    assert_eq!(counted, 1);
}

#[test]
fn zero_price_is_a_real_price() {
    let ds = run(json!({
        "0xa": {"instances": {"free": located(json!({"price": 0}))}},
        "0xb": {"instances": {"none": located(json!({}))}}
    }));
    assert_eq!(ds.orchestrators[0].avg_price, Metric::Valid(0.0));
    assert_eq!(ds.orchestrators[1].avg_price, Metric::NoData);

    let out = serde_json::to_value(&ds).unwrap();
    assert_eq!(out["orchestrators"][0]["avgPrice"], json!(0.0));
    assert_eq!(out["orchestrators"][1]["avgPrice"], Value::Null);
}

// ===========================================================================
// 2. Empty orchestrators
// ===========================================================================

#[test]
fn orchestrator_without_instances_has_no_data() {
    let ds = run(json!({"0xa": {"name": "idle", "instances": {}}}));
    let orch = &ds.orchestrators[0];
    assert_eq!(orch.avg_price, Metric::NoData);
    assert_eq!(orch.avg_discovery_time, Metric::NoData);
    assert_eq!(orch.avg_rtr, Metric::NoData);
    assert_eq!(orch.normalized_price, None);
    assert!(orch.avg_sr.is_finite());
}

// ===========================================================================
// 3. Degenerate bounds
// ===========================================================================

#[test]
fn constant_population_scores_one_not_nan() {
    let ds = run(json!({
        "0xa": {"instances": {"i": located(json!({"price": 5}))}},
        "0xb": {"instances": {"i": located(json!({"price": 5})), "j": located(json!({"price": 5}))}}
    }));
    for orch in &ds.orchestrators {
        assert_eq!(orch.normalized_price, Some(1.0));
        for inst in &orch.instances {
            assert_eq!(inst.normalized_price, Some(1.0));
        }
    }
}

#[test]
fn orchestrator_and_instance_passes_use_their_own_bounds() {
    let ds = run(json!({
        "0xa": {"instances": {"i": located(json!({"price": 2})), "j": located(json!({"price": 6}))}},
        "0xb": {"instances": {"i": located(json!({"price": 10}))}}
    }));
    // orchestrator means 4 and 10
    assert_eq!(ds.orchestrators[0].normalized_price, Some(1.0));
    assert_eq!(ds.orchestrators[1].normalized_price, Some(0.0));
    // instance prices 2, 6, 10
    assert_eq!(ds.orchestrators[0].instances[1].normalized_price, Some(0.5));
}

#[test]
fn higher_rtr_scores_lower() {
    let ds = run(json!({
        "0xa": {"instances": {"i": located(json!({})) }, "leaderboardResults": {"FRA": {"latestRTR": 1.0}}},
        "0xb": {"instances": {"i": located(json!({})) }, "leaderboardResults": {"FRA": {"latestRTR": 3.0}}}
    }));
    assert_eq!(ds.orchestrators[0].normalized_rtr, Some(1.0));
    assert_eq!(ds.orchestrators[1].normalized_rtr, Some(0.0));
}

// ===========================================================================
// 4. Bucketing
// ===========================================================================

#[test]
fn bucket_counts_sum_and_max_in_last_bucket() {
    let values: Vec<f64> = (0..50).map(|i| (i * i) as f64 / 7.0).collect();
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    for k in [1, 2, 5, 10, 33] {
        let buckets = bucketize(&values, k);
        assert_eq!(buckets.len(), k);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert!(buckets[k - 1].count >= 1, "max {} must land in bucket {}", max, k - 1);
    }
}

#[test]
fn histogram_over_processed_prices() {
    let ds = run(json!({
        "0xa": {"instances": {
            "a": located(json!({"price": 0})),
            "b": located(json!({"price": 50})),
            "c": located(json!({"price": 100}))
        }}
    }));
    let buckets = &ds.aggregates.buckets.pricing;
    assert_eq!(buckets.len(), 10);
    assert_eq!(buckets[0].count, 1);
    assert_eq!(buckets[5].count, 1);
    assert_eq!(buckets[9].count, 1);
    assert_eq!(buckets[9].range[1], 100.0);
}

// ===========================================================================
// 5. Percentiles
// ===========================================================================

#[test]
fn percentiles_use_direct_index() {
    let summary = summarize(&[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(summary.percentiles.p25, Some(2.0));
    assert_eq!(summary.median, Some(2.5));
    assert_eq!(summary.percentiles.p75, Some(4.0));
    assert_eq!(summary.range, Some([1.0, 4.0]));
}

// ===========================================================================
// 6. Location filter
// ===========================================================================

#[test]
fn unknown_location_instance_dropped() {
    let ds = run(json!({
        "0xa": {"name": "a", "instances": {
            "here": {"price": 2, "latitude": 40.7, "longitude": -74.0},
            "nowhere": {"price": 1, "latitude": -1, "longitude": -74.0}
        }}
    }));
    let instances = &ds.orchestrators[0].instances;
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].id, "here");
    assert_eq!(ds.dropped_instances, 1);
    assert_eq!(ds.instance_count(), 1);
    assert!(ds.instances().all(|i| i.has_known_location()));
    // the dropped instance contributes nothing
    assert_eq!(ds.orchestrators[0].avg_price, Metric::Valid(2.0));
}

#[test]
fn absent_coordinates_dropped() {
    let ds = run(json!({"0xa": {"instances": {"i": {"price": 1, "latitude": 10}}}}));
    assert!(ds.orchestrators[0].instances.is_empty());
    assert_eq!(ds.orchestrators[0].avg_price, Metric::NoData);
}

// ===========================================================================
// 7. Region best
// ===========================================================================

#[test]
fn region_best_price_is_lowest() {
    let ds = run(json!({
        "0xa": {"instances": {
            "a": located(json!({"price": 5, "probedFrom": {"FRA": {"lastTime": 1}}})),
            "b": located(json!({"price": 3, "probedFrom": {"FRA": {"lastTime": 2}}}))
        }}
    }));
    assert_eq!(ds.orchestrators[0].best_price_by_region["FRA"], Metric::Valid(3.0));
}

// ===========================================================================
// Output shape
// ===========================================================================

#[test]
fn serialized_shape_uses_consumer_keys() {
    let ds = run(json!({
        "0xa": {
            "name": "a",
            "instances": {"i": located(json!({
                "price": 1,
                "probedFrom": {"FRA": {"lastTime": 10}},
                "livepeer_regions": {"FRA": {}}
            }))},
            "regionalStats": {"FRA": {"avgDiscoveryTime": 120}},
            "leaderboardResults": {"FRA": {"latestRTR": 1.1, "latestSR": 1.0}}
        }
    }));
    let out = serde_json::to_value(&ds).unwrap();
    let orch = &out["orchestrators"][0];
    for key in [
        "avgPrice",
        "avgDiscoveryTime",
        "avgRTR",
        "avgSR",
        "bestPriceByRegion",
        "bestDiscoveryTimeByRegion",
        "bestRTRByRegion",
        "normalizedPrice",
        "normalizedDiscoveryTime",
        "normalizedRTR",
    ] {
        assert!(orch.get(key).is_some(), "missing orchestrator key {}", key);
    }
    let inst = &orch["instances"][0];
    assert_eq!(inst["lastPing"], json!(10.0));
    assert_eq!(inst["probedFrom"], json!(["FRA"]));
    assert_eq!(inst["livepeer_regions"], json!(["FRA"]));
    assert_eq!(inst["bestDiscoveryTime"], json!(120.0));
    assert!(out["perRegionStats"]["FRA"]["count"].is_number());
    for key in ["pricing", "discoveryTime", "performanceRTR", "performanceSR"] {
        assert!(out["aggregates"][key]["percentiles"].is_object(), "missing aggregate {}", key);
        assert!(out["aggregates"]["buckets"][key].is_array(), "missing buckets {}", key);
    }
}

#[test]
fn malformed_payload_fails_fast() {
    let err = process_json(b"[{\"name\": \"a\"}]", &PipelineOptions::default()).unwrap_err();
    assert!(err.to_string().starts_with("malformed payload"), "{}", err);
}
