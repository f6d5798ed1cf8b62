use std::cmp;

use tokio::runtime::{Builder, Runtime};

/// Creates the shared multi-thread tokio runtime.
///
/// The servers under test and the load driver share this process, so
/// one logical core is left for the OS.
pub fn get_rt() -> Runtime {
    let workers = cmp::max(num_cpus::get() - 1, 1);

    Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .expect("Failed to build the runtime.")
}
