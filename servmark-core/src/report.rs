use std::fmt;
use std::time::Duration;

/// The counts handed over by a single worker once its share is done.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    /// Requests which received a response, successful or not.
    pub completed: u64,
    /// Requests which received a non-2xx response or failed outright.
    pub errors: u64,
    /// The time the worker spent on its share.
    pub elapsed: Duration,
}

/// The merged outcome of one benchmark pass.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub total_requests: u64,
    pub total_errors: u64,
    /// Wall-clock time of the whole pass, not a sum of worker times.
    pub elapsed: Duration,
    pub requests_sec: f64,
}

/// Merges the per-worker results of one pass into a single report.
///
/// Throughput counts every request which produced a response, errored
/// or not, over the wall-clock elapsed time of the run. Errors are
/// reported alongside rather than subtracted.
pub fn aggregate(results: &[WorkerResult], elapsed: Duration) -> AggregateReport {
    let total_requests: u64 = results.iter().map(|result| result.completed).sum();
    let total_errors: u64 = results.iter().map(|result| result.errors).sum();

    let elapsed_secs = elapsed.as_secs_f64();
    let requests_sec = if elapsed_secs > 0.0 {
        total_requests as f64 / elapsed_secs
    } else {
        0.0
    };

    AggregateReport {
        total_requests,
        total_errors,
        elapsed,
        requests_sec,
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} requests in {:.2}s, {:.2} req/sec",
            self.total_requests,
            self.elapsed.as_secs_f64(),
            self.requests_sec,
        )?;
        write!(f, "  {} errors", self.total_errors)
    }
}
