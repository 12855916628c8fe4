use anyhow::Result;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

use orchscope::config::Config;
use orchscope::logging::{log, log_ranking, obj, v_str, Domain, Level};
use orchscope::projection::{ranking, Tab};
use orchscope::snapshot::{Snapshot, SnapshotStore};
use orchscope::source::{load, FileSource, HttpSource, PayloadSource};

fn report(snapshot: &Snapshot, top: usize) {
    for tab in Tab::ALL {
        let key = tab.ranking_key();
        let rows = ranking(&snapshot.dataset.orchestrators, key);
        let top_rows: Vec<(usize, &str, String)> = rows
            .iter()
            .take(top)
            .map(|r| (r.rank, r.name, r.display_value()))
            .collect();
        log_ranking(tab.title(), key.as_str(), &top_rows);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;
    let opts = cfg.pipeline_options();

    let source: Box<dyn PayloadSource> = match &cfg.payload_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(
            cfg.endpoint.clone(),
            Duration::from_secs(cfg.fetch_timeout_secs),
        )?),
    };

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("source", v_str(&source.describe())),
            ("poll_secs", json!(cfg.poll_secs)),
            ("bucket_count", json!(cfg.bucket_count)),
        ]),
    );

    let store = SnapshotStore::new();
    loop {
        match load(source.as_ref(), &opts).await {
            Ok(loaded) => {
                let snapshot = store.publish(loaded);
                report(&snapshot, cfg.ranking_top);
            }
            Err(err) => {
                store.fail(&err);
                if cfg.poll_secs == 0 {
                    return Err(err.into());
                }
            }
        }

        if cfg.poll_secs == 0 {
            break;
        }
        sleep(Duration::from_secs(cfg.poll_secs)).await;
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
