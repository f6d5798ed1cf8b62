use std::io::{self, ErrorKind};

use async_trait::async_trait;
use axum::body::Full;
use axum::routing::any;
use axum::Router;
use http::{header, Method, Response, Uri};
use hyper::body::Bytes;
use hyper::server::conn::AddrIncoming;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ServerAdapter, StartupError};
use crate::handler;

/// The framework backend, a single-route axum application.
pub struct AxumServer {
    port: u16,
    state: Option<RunningState>,
}

struct RunningState {
    port: u16,
    shutdown: oneshot::Sender<()>,
    server_task: JoinHandle<hyper::Result<()>>,
}

impl AxumServer {
    pub fn new(port: u16) -> Self {
        Self { port, state: None }
    }
}

#[async_trait]
impl ServerAdapter for AxumServer {
    fn name(&self) -> &'static str {
        "axum"
    }

    fn version(&self) -> &'static str {
        "0.6"
    }

    fn port(&self) -> u16 {
        self.state
            .as_ref()
            .map(|state| state.port)
            .unwrap_or(self.port)
    }

    async fn start(&mut self) -> Result<(), StartupError> {
        if self.state.is_some() {
            return Err(StartupError::AlreadyRunning);
        }

        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(StartupError::Bind)?;
        let port = listener.local_addr().map_err(StartupError::Bind)?.port();
        let incoming = AddrIncoming::from_listener(listener)
            .map_err(|e| StartupError::Bind(io::Error::new(ErrorKind::Other, e)))?;

        let app = Router::new().route("/rnd", any(rnd));

        let (shutdown, shutdown_rx) = oneshot::channel();
        let server = axum::Server::builder(incoming)
            .serve(app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
        let server_task = tokio::spawn(server);

        self.state = Some(RunningState {
            port,
            shutdown,
            server_task,
        });

        Ok(())
    }

    async fn shutdown(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };

        let _ = state.shutdown.send(());
        match state.server_task.await {
            Ok(Ok(())) => debug!("Axum server stopped."),
            Ok(Err(e)) => warn!(error = ?e, "Axum server terminated with an error."),
            Err(_) => warn!("Axum server task panicked."),
        }
    }
}

/// The random data route, every method lands here.
async fn rnd(method: Method, uri: Uri) -> Response<Full<Bytes>> {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let payload = handler::respond(&method, target);

    Response::builder()
        .status(payload.status)
        .header(header::CONTENT_TYPE, payload.content_type)
        .header(header::CONTENT_LENGTH, payload.body.len())
        .body(Full::from(payload.body))
        .expect("Build response")
}
