#[macro_use]
extern crate tracing;

mod config;
mod connection;
mod driver;
pub mod handler;
mod report;
pub mod servers;

pub use async_trait::async_trait;

pub use self::config::{BenchmarkConfig, ConfigError};
pub use self::driver::{DriverError, LoadDriver, ShutdownHandle};
pub use self::report::{aggregate, AggregateReport, WorkerResult};
pub use self::servers::axum_srv::AxumServer;
pub use self::servers::blocking::BlockingServer;
pub use self::servers::hyper_srv::HyperServer;
pub use self::servers::tokio_srv::TokioServer;
pub use self::servers::{ServerAdapter, StartupError};
