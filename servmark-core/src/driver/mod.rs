mod worker;

use std::io;

use futures_util::future::join_all;
use tokio::time::Instant;

pub use self::worker::ShutdownHandle;
use self::worker::Worker;
use crate::connection::Connector;
use crate::report::{aggregate, AggregateReport, WorkerResult};
use crate::BenchmarkConfig;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("The target URI is missing the required scheme (http)")]
    /// The target URI is missing the HTTP scheme.
    MissingScheme,
    #[error("The target URI has an invalid scheme, expected 'http' got {0:?}")]
    /// The target URI has a scheme which is not supported.
    InvalidScheme(String),
    #[error("The target URI is missing the required host")]
    /// The target URI is missing the server host.
    MissingHost,
    #[error("Failed to resolve the host socket address: {0}")]
    /// The system failed to resolve the socket address.
    AddressLookup(io::Error),
}

/// The fixed-concurrency request driver.
///
/// One driver issues the configured number of requests against the
/// target using a pool of concurrent workers and merges their counts
/// into a single report. A driver can run several passes, each pass
/// opens its own connections.
pub struct LoadDriver {
    config: BenchmarkConfig,
    connector: Connector,
    shutdown: ShutdownHandle,
}

impl LoadDriver {
    /// Creates a new driver for the given configuration.
    ///
    /// The target host is resolved once here rather than per worker.
    pub fn new(config: BenchmarkConfig) -> Result<Self, DriverError> {
        let connector = Connector::from_uri(&config.target)?;

        Ok(Self {
            config,
            connector,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// A handle which cancels the run when triggered.
    ///
    /// Workers stop issuing new requests once the handle is set, any
    /// in-flight request is finished first.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Runs one pass to completion and aggregates the results.
    pub async fn run(&self) -> AggregateReport {
        let shares = partition(self.config.total_requests, self.config.concurrency);
        let (results_tx, results_rx) = flume::unbounded();

        debug!(
            total_requests = self.config.total_requests,
            concurrency = self.config.concurrency,
            keep_alive = self.config.keep_alive,
            "Starting load pass."
        );

        let start = Instant::now();

        let mut workers = Vec::with_capacity(self.config.concurrency);
        for (worker_id, requests) in shares.into_iter().enumerate() {
            let worker = Worker {
                worker_id,
                requests,
                keep_alive: self.config.keep_alive,
                connector: self.connector.clone(),
                shutdown: self.shutdown.clone(),
                results: results_tx.clone(),
            };

            workers.push(tokio::spawn(worker.run()));
        }
        drop(results_tx);

        join_all(workers).await;
        let elapsed = start.elapsed();

        let results: Vec<WorkerResult> = results_rx.drain().collect();
        aggregate(&results, elapsed)
    }
}

/// Splits the request total across workers as evenly as possible.
///
/// Any remainder goes to the first workers, the shares always sum to
/// the given total.
fn partition(total: u64, workers: usize) -> Vec<u64> {
    let per_worker = total / workers as u64;
    let mut remainder = total - (per_worker * workers as u64);

    let mut shares = Vec::with_capacity(workers);
    for _ in 0..workers {
        let modifier = if remainder != 0 {
            remainder -= 1;
            1
        } else {
            0
        };
        shares.push(per_worker + modifier);
    }

    shares
}
