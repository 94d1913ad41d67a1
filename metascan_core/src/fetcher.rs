//! Batch orchestration: fan-out over a set of contracts with per-contract
//! failure isolation and input-order-preserving output.
//!
//! One unreachable or non-implementing contract never aborts a batch — it
//! degrades to a record with `has_contract_uri = false`. The only batch-level
//! failures are the optional deadline ([`FetchError::BatchCancelled`]) and a
//! panicked worker ([`FetchError::Worker`]).

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::classifier;
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::record::{ContractAddress, ContractMetadata};
use crate::source::MetadataSource;

/// Fetches normalized metadata records for one or many contracts.
pub struct BatchFetcher {
    source: Arc<dyn MetadataSource>,
    config: FetcherConfig,
}

impl BatchFetcher {
    /// Creates a fetcher with default settings.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self::with_config(source, FetcherConfig::default())
    }

    /// Creates a fetcher with explicit settings.
    pub fn with_config(source: Arc<dyn MetadataSource>, config: FetcherConfig) -> Self {
        Self { source, config }
    }

    /// Fetches the metadata record for a single contract.
    ///
    /// Never fails: any accessor error is absorbed into a record with
    /// `has_contract_uri = false`.
    pub async fn fetch_one(&self, address: &str) -> ContractMetadata {
        read_record(self.source.as_ref(), address).await
    }

    /// Fetches records for every address, one record per input, in input
    /// order.
    ///
    /// Fetches run concurrently up to `max_in_flight`; completion order does
    /// not affect output order. When the configured batch deadline expires,
    /// in-flight fetches are abandoned and the whole call fails with
    /// [`FetchError::BatchCancelled`] — no partial output is returned.
    pub async fn fetch_many(
        &self,
        addresses: &[ContractAddress],
    ) -> Result<Vec<ContractMetadata>, FetchError> {
        let total = addresses.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        debug!(
            total,
            max_in_flight = self.config.max_in_flight,
            "starting batch fetch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut tasks: JoinSet<(usize, ContractMetadata)> = JoinSet::new();
        for (index, address) in addresses.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fetch semaphore is never closed");
                (index, read_record(source.as_ref(), &address).await)
            });
        }

        // Index-addressed write-once slots keep output order equal to input
        // order regardless of completion order.
        let mut slots: Vec<Option<ContractMetadata>> = vec![None; total];
        let drained = match self.config.batch_timeout() {
            Some(limit) => tokio::time::timeout(limit, drain(&mut tasks, &mut slots)).await,
            None => Ok(drain(&mut tasks, &mut slots).await),
        };
        match drained {
            Ok(result) => result?,
            Err(_) => {
                tasks.abort_all();
                let completed = slots.iter().filter(|slot| slot.is_some()).count();
                warn!(
                    completed,
                    total, "batch deadline expired, abandoning in-flight fetches"
                );
                return Err(FetchError::BatchCancelled {
                    completed,
                    total,
                    timeout_secs: self.config.batch_timeout_secs,
                });
            }
        }

        let mut records = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(record) => records.push(record),
                None => {
                    return Err(FetchError::Worker(format!(
                        "no result recorded for input index {index}"
                    )))
                }
            }
        }
        debug!(total, "batch fetch complete");
        Ok(records)
    }
}

/// Reads one contract's URI and folds the outcome into a record.
async fn read_record(source: &dyn MetadataSource, address: &str) -> ContractMetadata {
    match source.contract_uri(address).await {
        Ok(uri) => {
            debug!(
                address,
                embedded = classifier::is_embedded(&uri),
                "contractURI read"
            );
            ContractMetadata::from_uri(address, uri)
        }
        Err(err) => {
            debug!(address, %err, "contractURI unavailable");
            ContractMetadata::unavailable(address)
        }
    }
}

/// Joins every task, writing each result into its input-index slot.
async fn drain(
    tasks: &mut JoinSet<(usize, ContractMetadata)>,
    slots: &mut [Option<ContractMetadata>],
) -> Result<(), FetchError> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, record)) => slots[index] = Some(record),
            Err(err) => return Err(FetchError::Worker(err.to_string())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::source::SourceError;

    /// In-memory source: a URI table, a set of failing addresses, and an
    /// optional artificial latency.
    #[derive(Default)]
    struct MockSource {
        uris: HashMap<String, String>,
        fail: HashSet<String>,
        panic_on: HashSet<String>,
        delay: Option<Duration>,
    }

    impl MockSource {
        fn with_uri(mut self, address: &str, uri: &str) -> Self {
            self.uris.insert(address.to_string(), uri.to_string());
            self
        }

        fn with_failure(mut self, address: &str) -> Self {
            self.fail.insert(address.to_string());
            self
        }

        fn with_panic(mut self, address: &str) -> Self {
            self.panic_on.insert(address.to_string());
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl MetadataSource for MockSource {
        async fn contract_uri(&self, address: &str) -> Result<String, SourceError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panic_on.contains(address) {
                panic!("mock source blew up for {address}");
            }
            if self.fail.contains(address) {
                return Err(SourceError::new("execution reverted"));
            }
            self.uris
                .get(address)
                .cloned()
                .ok_or_else(|| SourceError::new("no code at address"))
        }
    }

    fn fetcher(source: MockSource) -> BatchFetcher {
        BatchFetcher::new(Arc::new(source))
    }

    fn addresses(n: usize) -> Vec<ContractAddress> {
        (0..n).map(|i| format!("0x{i:040x}")).collect()
    }

    #[tokio::test]
    async fn test_fetch_one_external_uri() {
        let source = MockSource::default().with_uri("0xa", "https://example.com/meta.json");
        let record = fetcher(source).fetch_one("0xa").await;
        assert!(record.has_contract_uri);
        assert!(!record.is_embedded);
        assert_eq!(record.uri, "https://example.com/meta.json");
    }

    #[tokio::test]
    async fn test_fetch_one_embedded_uri() {
        let uri = "data:application/json;utf8,{\"name\":\"Foo\"}";
        let source = MockSource::default().with_uri("0xa", uri);
        let record = fetcher(source).fetch_one("0xa").await;
        assert!(record.has_contract_uri);
        assert!(record.is_embedded);
        assert_eq!(classifier::extract_payload(&record.uri).unwrap(), b"{\"name\":\"Foo\"}");
        // Schema fields stay untouched by the fetch path.
        assert!(record.name.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_unavailable_never_errors() {
        let source = MockSource::default().with_failure("0xa");
        let record = fetcher(source).fetch_one("0xa").await;
        assert_eq!(record.address, "0xa");
        assert!(!record.has_contract_uri);
        assert!(!record.is_embedded);
        assert!(record.uri.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_many_empty_input() {
        let records = fetcher(MockSource::default()).fetch_many(&[]).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_many_isolates_failure_and_keeps_order() {
        let source = MockSource::default()
            .with_uri("0xa", "https://a.example/meta.json")
            .with_failure("0xb")
            .with_uri("0xc", "data:application/json;utf8,{}");
        let input: Vec<ContractAddress> =
            vec!["0xa".to_string(), "0xb".to_string(), "0xc".to_string()];

        let records = fetcher(source).fetch_many(&input).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].address, "0xa");
        assert!(records[0].has_contract_uri);
        assert_eq!(records[1].address, "0xb");
        assert!(!records[1].has_contract_uri);
        assert_eq!(records[2].address, "0xc");
        assert!(records[2].is_embedded);
    }

    #[tokio::test]
    async fn test_fetch_many_hundred_with_every_tenth_failing() {
        let input = addresses(100);
        let mut source = MockSource::default();
        for (i, address) in input.iter().enumerate() {
            if i % 10 == 0 {
                source = source.with_failure(address);
            } else {
                source = source.with_uri(address, &format!("https://example.com/{i}.json"));
            }
        }

        let records = fetcher(source).fetch_many(&input).await.unwrap();
        assert_eq!(records.len(), 100);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.address, input[i]);
            assert_eq!(record.has_contract_uri, i % 10 != 0);
        }
        assert_eq!(records.iter().filter(|r| !r.has_contract_uri).count(), 10);
    }

    #[tokio::test]
    async fn test_fetch_many_worker_panic_fails_whole_batch() {
        // A panic is a bug in the source, not a per-contract condition: it
        // must surface as a batch-level Worker error, never as partial output.
        let source = MockSource::default()
            .with_uri("0xa", "https://a.example/meta.json")
            .with_panic("0xb")
            .with_uri("0xc", "https://c.example/meta.json");
        let input: Vec<ContractAddress> =
            vec!["0xa".to_string(), "0xb".to_string(), "0xc".to_string()];

        let err = fetcher(source).fetch_many(&input).await.unwrap_err();
        match err {
            FetchError::Worker(reason) => assert!(reason.contains("panic")),
            other => panic!("expected Worker, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_order_survives_out_of_order_completion() {
        // All fetches share one latency but the semaphore admits them in
        // waves, so completion interleaves; output must still match input.
        let input = addresses(20);
        let mut source = MockSource::default().with_delay(Duration::from_millis(50));
        for (i, address) in input.iter().enumerate() {
            source = source.with_uri(address, &format!("ipfs://Qm{i}"));
        }

        let config = FetcherConfig {
            max_in_flight: 3,
            batch_timeout_secs: 0,
        };
        let fetcher = BatchFetcher::with_config(Arc::new(source), config);
        let records = fetcher.fetch_many(&input).await.unwrap();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.address, input[i]);
            assert_eq!(record.uri, format!("ipfs://Qm{i}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_deadline_cancels_whole_batch() {
        let input = addresses(4);
        let mut source = MockSource::default().with_delay(Duration::from_secs(60));
        for address in &input {
            source = source.with_uri(address, "https://slow.example/meta.json");
        }

        let config = FetcherConfig {
            max_in_flight: 8,
            batch_timeout_secs: 5,
        };
        let fetcher = BatchFetcher::with_config(Arc::new(source), config);
        let err = fetcher.fetch_many(&input).await.unwrap_err();
        match err {
            FetchError::BatchCancelled {
                completed,
                total,
                timeout_secs,
            } => {
                assert_eq!(completed, 0);
                assert_eq!(total, 4);
                assert_eq!(timeout_secs, 5);
            }
            other => panic!("expected BatchCancelled, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_within_deadline_succeeds() {
        let input = addresses(4);
        let mut source = MockSource::default().with_delay(Duration::from_secs(1));
        for address in &input {
            source = source.with_uri(address, "https://fast.example/meta.json");
        }

        let config = FetcherConfig {
            max_in_flight: 8,
            batch_timeout_secs: 30,
        };
        let fetcher = BatchFetcher::with_config(Arc::new(source), config);
        let records = fetcher.fetch_many(&input).await.unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.has_contract_uri));
    }
}
