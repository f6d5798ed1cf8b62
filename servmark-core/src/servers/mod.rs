pub mod axum_srv;
pub mod blocking;
pub mod hyper_srv;
pub mod tokio_srv;

use std::io;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to bind the listening socket: {0}")]
    /// The listening port could not be bound or the backend rejected
    /// its configuration.
    Bind(io::Error),
    #[error("The server is already running")]
    /// Start was called a second time before shutdown.
    AlreadyRunning,
}

#[async_trait]
/// The uniform lifecycle contract over one concrete server backend.
pub trait ServerAdapter: Send {
    /// A short descriptive name used in the report banner.
    fn name(&self) -> &'static str;

    /// The version of the wrapped server library, or `"unknown"` where
    /// no meaningful version applies.
    fn version(&self) -> &'static str;

    /// The port the server is bound to.
    ///
    /// Before `start` this is the configured port, afterwards the
    /// actual bound port, which matters when binding port 0.
    fn port(&self) -> u16;

    /// Binds the listening socket and begins accepting connections.
    ///
    /// Resolves once the socket is bound and ready for clients.
    async fn start(&mut self) -> Result<(), StartupError>;

    /// Stops accepting connections and releases the listening socket.
    ///
    /// Idempotent, a second call is a no-op. The adapter is not
    /// reusable afterwards.
    async fn shutdown(&mut self);
}
