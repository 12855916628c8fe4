//! Structured JSON-lines logging.
//!
//! Every record carries a run id, a monotonically increasing sequence number,
//! a level and a domain. Records always go to stdout; when `LOG_DIR` is set
//! they are also written under `<LOG_DIR>/<run_id>/`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v.to_lowercase()))
            .unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Fetch,        // Payload retrieval
    Pipeline,     // Derivation and aggregation
    Normalize,    // Min-max scoring
    Distribution, // Buckets and percentiles
    Snapshot,     // Dataset publication
    System,       // Startup, shutdown
    Profile,      // Stage timings
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Fetch => "fetch",
            Domain::Pipeline => "pipeline",
            Domain::Normalize => "normalize",
            Domain::Distribution => "distribution",
            Domain::Snapshot => "snapshot",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    /// `LOG_DOMAINS` is a comma-separated allow list, or `all`.
    pub fn enabled_in(&self, filter: Option<&str>) -> bool {
        match filter {
            None | Some("all") => true,
            Some(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled_in(std::env::var("LOG_DOMAINS").ok().as_deref())
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let Ok(base) = std::env::var("LOG_DIR") else {
            return RunContext { run_id, events: None, trace: None };
        };
        let run_dir = PathBuf::from(base).join(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
            return RunContext { run_id, events: None, trace: None };
        }
        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );
        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain, event, fields);
}

fn build_record(run_id: &str, seq: u64, level: Level, domain: Domain, event: &str, mut fields: Map<String, Value>) -> Value {
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(seq));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry)
}

fn emit_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, next_seq(), level, domain, event, fields).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_fetch(source: &str, bytes: usize, digest: &str, elapsed_ms: f64) {
    log(
        Level::Info,
        Domain::Fetch,
        "payload_loaded",
        obj(&[
            ("source", v_str(source)),
            ("bytes", json!(bytes)),
            ("digest", v_str(digest)),
            ("elapsed_ms", v_num(elapsed_ms)),
        ]),
    );
}

pub fn log_fetch_failure(source: &str, kind: &str, error: &str) {
    log(
        Level::Error,
        Domain::Fetch,
        "load_failed",
        obj(&[
            ("source", v_str(source)),
            ("kind", v_str(kind)),
            ("msg", v_str(error)),
        ]),
    );
}

pub fn log_dropped_instances(dropped: usize, total: usize) {
    log(
        Level::Debug,
        Domain::Pipeline,
        "unknown_location_dropped",
        obj(&[("dropped", json!(dropped)), ("total", json!(total))]),
    );
}

pub fn log_bounds(kpi: &str, members: usize, bounds: Option<(f64, f64)>) {
    let (min, max) = match bounds {
        Some((lo, hi)) => (v_num(lo), v_num(hi)),
        None => (Value::Null, Value::Null),
    };
    log(
        Level::Debug,
        Domain::Normalize,
        "bounds",
        obj(&[
            ("kpi", v_str(kpi)),
            ("members", json!(members)),
            ("min", min),
            ("max", max),
        ]),
    );
}

pub fn log_distribution(key: &str, samples: usize, bucket_count: usize) {
    log(
        Level::Debug,
        Domain::Distribution,
        "built",
        obj(&[
            ("key", v_str(key)),
            ("samples", json!(samples)),
            ("bucket_count", json!(bucket_count)),
        ]),
    );
}

pub fn log_snapshot_summary(
    digest: &str,
    orchestrators: usize,
    instances: usize,
    dropped: usize,
    unchanged: bool,
) {
    log(
        Level::Info,
        Domain::Snapshot,
        "published",
        obj(&[
            ("digest", v_str(digest)),
            ("orchestrators", json!(orchestrators)),
            ("instances", json!(instances)),
            ("dropped_instances", json!(dropped)),
            ("unchanged", json!(unchanged)),
        ]),
    );
}

pub fn log_ranking(tab: &str, kpi: &str, rows: &[(usize, &str, String)]) {
    let top: Vec<Value> = rows
        .iter()
        .map(|(rank, name, value)| json!({"rank": rank, "name": name, "value": value}))
        .collect();
    log(
        Level::Info,
        Domain::Snapshot,
        "ranking",
        obj(&[("tab", v_str(tab)), ("kpi", v_str(kpi)), ("top", Value::Array(top))]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits the elapsed time of a pipeline stage on drop.
pub struct ProfileScope {
    component: &'static str,
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn new(component: &'static str, label: &'static str) -> Self {
        Self {
            component,
            label,
            context: None,
            started: Instant::now(),
            enabled: Self::should_sample(),
        }
    }

    pub fn with_context(component: &'static str, label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            component,
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    /// `PROFILE_SAMPLE` in `[0, 1]`; unset means every scope is recorded.
    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    ((seq % 10_000) as f64 / 10_000.0) < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("component".to_string(), v_str(self.component));
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
