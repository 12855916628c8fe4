//! Where payloads come from.
//!
//! A source only produces the raw body; decoding and processing happen in
//! [`load`], which either returns a complete dataset or an error. There is no
//! retry here: a failed load is terminal for that cycle.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Instant;

use crate::error::LoadError;
use crate::logging::{log_fetch, log_fetch_failure};
use crate::model::ProcessedDataset;
use crate::pipeline::{process_json, PipelineOptions};

#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Human-readable origin for logs.
    fn describe(&self) -> String;
    async fn fetch_body(&self) -> Result<Vec<u8>, LoadError>;
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: ProcessedDataset,
    /// Hex SHA-256 of the payload body.
    pub digest: String,
    pub bytes: usize,
}

pub fn payload_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

pub async fn load(
    source: &dyn PayloadSource,
    opts: &PipelineOptions,
) -> Result<LoadedDataset, LoadError> {
    let started = Instant::now();
    let result = fetch_and_process(source, opts).await;
    match &result {
        Ok(loaded) => log_fetch(
            &source.describe(),
            loaded.bytes,
            &loaded.digest,
            started.elapsed().as_secs_f64() * 1000.0,
        ),
        Err(err) => log_fetch_failure(&source.describe(), err.kind(), &err.to_string()),
    }
    result
}

async fn fetch_and_process(
    source: &dyn PayloadSource,
    opts: &PipelineOptions,
) -> Result<LoadedDataset, LoadError> {
    let body = source.fetch_body().await?;
    let dataset = process_json(&body, opts)?;
    Ok(LoadedDataset {
        dataset,
        digest: payload_digest(&body),
        bytes: body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Static(&'static [u8]);

    #[async_trait]
    impl PayloadSource for Static {
        fn describe(&self) -> String {
            "static".to_string()
        }

        async fn fetch_body(&self) -> Result<Vec<u8>, LoadError> {
            Ok(self.0.to_vec())
        }
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let d1 = payload_digest(b"{}");
        let d2 = payload_digest(b"{}");
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
        assert_ne!(d1, payload_digest(b"{ }"));
    }

    #[tokio::test]
    async fn test_load_processes_body() {
        let source = Static(br#"{"0x1":{"name":"a","instances":{"i":{"price":2,"latitude":1,"longitude":1}}}}"#);
        let loaded = load(&source, &PipelineOptions::default()).await.unwrap();
        assert_eq!(loaded.dataset.orchestrators.len(), 1);
        assert_eq!(loaded.bytes, source.0.len());
        assert_eq!(loaded.digest, payload_digest(source.0));
    }

    #[tokio::test]
    async fn test_load_fails_fast_on_malformed() {
        let source = Static(b"[]");
        let err = load(&source, &PipelineOptions::default()).await.unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload(_)));
    }
}
