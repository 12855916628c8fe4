//! Population-wide min-max normalization.
//!
//! `score = 1 - (value - min) / (max - min)`, so the smallest value in the
//! population scores 1. The formula is applied to RTR as well, which means a
//! higher realtime ratio scores lower.

use crate::logging::log_bounds;
use crate::metric::Metric;
use crate::model::{Instance, Orchestrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kpi {
    Price,
    DiscoveryTime,
    Rtr,
}

impl Kpi {
    pub const ALL: [Kpi; 3] = [Kpi::Price, Kpi::DiscoveryTime, Kpi::Rtr];

    /// Price may be zero; time and ratio must be strictly positive.
    pub fn accepts(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Kpi::Price => value >= 0.0,
                Kpi::DiscoveryTime | Kpi::Rtr => value > 0.0,
            }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kpi::Price => "price",
            Kpi::DiscoveryTime => "discovery_time",
            Kpi::Rtr => "rtr",
        }
    }
}

/// Anything that carries the three normalizable KPIs.
pub trait Scored {
    fn kpi(&self, kpi: Kpi) -> Metric;
    fn set_normalized(&mut self, kpi: Kpi, score: Option<f64>);
}

impl Scored for Orchestrator {
    fn kpi(&self, kpi: Kpi) -> Metric {
        match kpi {
            Kpi::Price => self.avg_price,
            Kpi::DiscoveryTime => self.avg_discovery_time,
            Kpi::Rtr => self.avg_rtr,
        }
    }

    fn set_normalized(&mut self, kpi: Kpi, score: Option<f64>) {
        match kpi {
            Kpi::Price => self.normalized_price = score,
            Kpi::DiscoveryTime => self.normalized_discovery_time = score,
            Kpi::Rtr => self.normalized_rtr = score,
        }
    }
}

impl Scored for Instance {
    fn kpi(&self, kpi: Kpi) -> Metric {
        match kpi {
            Kpi::Price => self.price,
            Kpi::DiscoveryTime => self.best_discovery_time,
            Kpi::Rtr => self.avg_rtr,
        }
    }

    fn set_normalized(&mut self, kpi: Kpi, score: Option<f64>) {
        match kpi {
            Kpi::Price => self.normalized_price = score,
            Kpi::DiscoveryTime => self.normalized_discovery_time = score,
            Kpi::Rtr => self.normalized_rtr = score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// `None` when no value is valid for `kpi`.
    pub fn collect(values: impl IntoIterator<Item = Metric>, kpi: Kpi) -> Option<Self> {
        values
            .into_iter()
            .filter_map(|m| m.value())
            .filter(|v| kpi.accepts(*v))
            .fold(None, |acc: Option<Bounds>, v| {
                Some(match acc {
                    None => Bounds { min: v, max: v },
                    Some(b) => Bounds { min: b.min.min(v), max: b.max.max(v) },
                })
            })
    }

    /// A degenerate population (`max == min`) scores 1 for every member.
    pub fn score(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 1.0;
        }
        1.0 - (value - self.min) / span
    }
}

/// Normalize all three KPIs across `population`, writing scores in place.
/// Bounds are computed once per KPI before any entity is touched.
pub fn normalize_population<T: Scored>(population: &mut [T]) {
    for kpi in Kpi::ALL {
        let bounds = Bounds::collect(population.iter().map(|e| e.kpi(kpi)), kpi);
        log_bounds(kpi.as_str(), population.len(), bounds.map(|b| (b.min, b.max)));
        for entity in population.iter_mut() {
            let score = match (entity.kpi(kpi).value(), bounds) {
                (Some(v), Some(b)) if kpi.accepts(v) => Some(b.score(v)),
                _ => None,
            };
            entity.set_normalized(kpi, score);
        }
    }
}

/// Instance pass over every retained instance of every orchestrator.
pub fn normalize_instances(orchestrators: &mut [Orchestrator]) {
    let mut flat: Vec<&mut Instance> = orchestrators
        .iter_mut()
        .flat_map(|o| o.instances.iter_mut())
        .collect();
    normalize_population(&mut flat);
}

impl<T: Scored + ?Sized> Scored for &mut T {
    fn kpi(&self, kpi: Kpi) -> Metric {
        (**self).kpi(kpi)
    }

    fn set_normalized(&mut self, kpi: Kpi, score: Option<f64>) {
        (**self).set_normalized(kpi, score)
    }
}
