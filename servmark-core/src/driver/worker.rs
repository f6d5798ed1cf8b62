use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::connection::Connector;
use crate::report::WorkerResult;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default, Clone)]
pub struct ShutdownHandle {
    /// A signal flag telling all workers to stop issuing requests.
    should_stop: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Checks if the worker should abort processing.
    pub fn should_abort(&self) -> bool {
        self.should_stop.load(Ordering::Relaxed)
    }

    /// Sets the abort flag across workers.
    pub fn set_abort(&self) {
        self.should_stop.store(true, Ordering::Relaxed);
    }
}

/// One worker of a load pass.
///
/// A worker owns its counters for the whole run and hands them over as
/// a single [WorkerResult] once it has finished its share, nothing is
/// shared with other workers inside the request loop.
pub(crate) struct Worker {
    pub worker_id: usize,
    pub requests: u64,
    pub keep_alive: bool,
    pub connector: Connector,
    pub shutdown: ShutdownHandle,
    pub results: flume::Sender<WorkerResult>,
}

impl Worker {
    /// Issues this worker's share of requests sequentially.
    pub(crate) async fn run(self) {
        let start = Instant::now();
        let mut completed = 0;
        let mut errors = 0;
        let mut conn = None;

        let mut remaining = self.requests;
        while remaining > 0 && !self.shutdown.should_abort() {
            let mut connection = match conn.take() {
                Some(connection) => connection,
                None => match self.connector.connect_timeout(CONNECT_TIMEOUT).await {
                    Ok(Some(connection)) => connection,
                    Ok(None) => {
                        error!(
                            worker_id = self.worker_id,
                            "Worker failed to connect to the server within {CONNECT_TIMEOUT:?}, dropping its remaining requests."
                        );
                        errors += 1;
                        break;
                    },
                    Err(e) => {
                        error!(
                            worker_id = self.worker_id,
                            error = ?e,
                            "Worker failed to connect to the server, dropping its remaining requests."
                        );
                        errors += 1;
                        break;
                    },
                },
            };

            match connection.execute(self.connector.new_request()).await {
                Ok(status) => {
                    completed += 1;
                    if !status.is_success() {
                        errors += 1;
                    }
                },
                Err(e) => {
                    debug!(
                        worker_id = self.worker_id,
                        error = ?e,
                        "Request failed, dropping the remainder of this worker's share."
                    );
                    errors += 1;
                    break;
                },
            }

            remaining -= 1;
            if self.keep_alive {
                conn = Some(connection);
            }
        }

        let result = WorkerResult {
            completed,
            errors,
            elapsed: start.elapsed(),
        };

        // The receiver outlives every worker, a send only fails if the
        // whole run was dropped.
        let _ = self.results.send(result);
    }
}
