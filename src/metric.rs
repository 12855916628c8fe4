//! Tagged optional KPI value.
//!
//! A KPI is either a usable number or explicitly missing. `NoData` sorts above
//! every valid value, so it can seed a running minimum the same way an
//! infinite value would, but it never leaks into arithmetic.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    Valid(f64),
    #[default]
    NoData,
}

impl Metric {
    /// Accepts finite values that pass `accept`; everything else is `NoData`.
    pub fn from_checked(value: Option<f64>, accept: impl Fn(f64) -> bool) -> Self {
        match value {
            Some(v) if v.is_finite() && accept(v) => Metric::Valid(v),
            _ => Metric::NoData,
        }
    }

    /// Finite and `>= 0`.
    pub fn non_negative(value: Option<f64>) -> Self {
        Self::from_checked(value, |v| v >= 0.0)
    }

    /// Finite and `> 0`.
    pub fn positive(value: Option<f64>) -> Self {
        Self::from_checked(value, |v| v > 0.0)
    }

    /// Arithmetic mean, `NoData` for an empty sample.
    pub fn mean(values: &[f64]) -> Self {
        if values.is_empty() {
            return Metric::NoData;
        }
        Metric::Valid(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Valid(v) => Some(*v),
            Metric::NoData => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Metric::Valid(_))
    }

    /// Total order used for best-of selection: valid values ascending, then `NoData`.
    pub fn cmp_best(&self, other: &Metric) -> Ordering {
        match (self, other) {
            (Metric::Valid(a), Metric::Valid(b)) => a.total_cmp(b),
            (Metric::Valid(_), Metric::NoData) => Ordering::Less,
            (Metric::NoData, Metric::Valid(_)) => Ordering::Greater,
            (Metric::NoData, Metric::NoData) => Ordering::Equal,
        }
    }
}

impl From<f64> for Metric {
    fn from(v: f64) -> Self {
        Self::from_checked(Some(v), |_| true)
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Valid(v) => serializer.serialize_f64(*v),
            Metric::NoData => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Valid(v) => write!(f, "{:.2}", v),
            Metric::NoData => f.write_str("?"),
        }
    }
}
