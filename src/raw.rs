//! Wire types for the orchestrator JSON document.
//!
//! Decoding is strict about shape (the payload and every orchestrator and
//! instance must be objects) and lenient about individual numbers: a metric
//! that is absent, `null` or of the wrong type decodes as `None`.

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

use crate::error::LoadError;

/// JSON object decoded into its entries, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<T>(pub Vec<(String, T)>);

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<T> Entries<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let capacity = map.size_hint().unwrap_or(0);
                let mut out: Vec<(String, T)> = Vec::with_capacity(capacity);
                let mut positions: HashMap<String, usize> = HashMap::with_capacity(capacity);
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    // Repeated key: last value wins, first position is kept.
                    match positions.get(&key) {
                        Some(&idx) => out[idx].1 = value,
                        None => {
                            positions.insert(key.clone(), out.len());
                            out.push((key, value));
                        }
                    }
                }
                Ok(Entries(out))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// The whole document: orchestrator id -> orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawPayload {
    pub orchestrators: Entries<RawOrchestrator>,
}

impl RawPayload {
    /// Decode a payload body. Non-JSON is a syntax error; JSON of the wrong
    /// shape is a malformed payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, LoadError> {
        serde_json::from_slice(body).map_err(LoadError::from_decode)
    }

    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        serde_json::from_value(value).map_err(LoadError::from_decode)
    }

    pub fn instance_count(&self) -> usize {
        self.orchestrators.iter().map(|(_, o)| o.instances.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawOrchestrator {
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "or_default")]
    pub instances: Entries<RawInstance>,
    #[serde(rename = "regionalStats", default, deserialize_with = "or_default")]
    pub regional_stats: BTreeMap<String, RawRegionalStat>,
    #[serde(rename = "leaderboardResults", default, deserialize_with = "or_default")]
    pub leaderboard_results: BTreeMap<String, RawLeaderboard>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawInstance {
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(rename = "probedFrom", default, deserialize_with = "or_default")]
    pub probed_from: BTreeMap<String, RawProbe>,
    #[serde(default, deserialize_with = "region_keys")]
    pub regions: BTreeSet<String>,
    #[serde(default, deserialize_with = "region_keys")]
    pub livepeer_regions: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawProbe {
    pub last_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawRegionalStat {
    pub avg_discovery_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawLeaderboard {
    pub latest_rtr: Option<f64>,
    pub latest_sr: Option<f64>,
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

impl From<Value> for RawProbe {
    fn from(value: Value) -> Self {
        Self { last_time: number_field(&value, "lastTime") }
    }
}

impl From<Value> for RawRegionalStat {
    fn from(value: Value) -> Self {
        Self { avg_discovery_time: number_field(&value, "avgDiscoveryTime") }
    }
}

impl From<Value> for RawLeaderboard {
    fn from(value: Value) -> Self {
        Self {
            latest_rtr: number_field(&value, "latestRTR"),
            latest_sr: number_field(&value, "latestSR"),
        }
    }
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_f64()))
}

fn region_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let map: Option<BTreeMap<String, IgnoredAny>> = Option::deserialize(deserializer)?;
    Ok(map.map(|m| m.into_keys().collect()).unwrap_or_default())
}
