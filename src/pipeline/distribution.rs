//! Histogram buckets and order statistics for one KPI population.
//!
//! Inputs are expected to be pre-filtered to valid, finite values.

use crate::model::{Bucket, Percentiles, Summary};

pub const DEFAULT_BUCKETS: usize = 10;

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))))
}

/// Split `[min, max]` into `bucket_count` equal-width buckets.
///
/// Empty input yields `bucket_count` empty `[0, 0]` buckets; a constant input
/// collapses to a single bucket. The maximum always lands in the last bucket.
pub fn bucketize(values: &[f64], bucket_count: usize) -> Vec<Bucket> {
    let k = bucket_count.max(1);
    let Some((min, max)) = min_max(values) else {
        return vec![Bucket { range: [0.0, 0.0], count: 0 }; k];
    };
    if min == max {
        return vec![Bucket { range: [min, max], count: values.len() }];
    }

    let width = (max - min) / k as f64;
    let mut buckets: Vec<Bucket> = (0..k)
        .map(|i| Bucket {
            range: [min + i as f64 * width, min + (i + 1) as f64 * width],
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(k - 1);
        buckets[idx].count += 1;
    }
    buckets
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Direct index pick, no interpolation: `sorted[floor(n * fraction)]`.
fn index_pick(sorted: &[f64], fraction: f64) -> f64 {
    let idx = (sorted.len() as f64 * fraction).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn summarize(values: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p50 = median(&sorted);
    Summary {
        median: Some(p50),
        percentiles: Percentiles {
            p25: Some(index_pick(&sorted, 0.25)),
            p50: Some(p50),
            p75: Some(index_pick(&sorted, 0.75)),
        },
        range: min_max(values).map(|(lo, hi)| [lo, hi]),
    }
}
