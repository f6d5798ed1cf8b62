use std::cmp;
use std::convert::Infallible;
use std::io::{self, ErrorKind};

use async_trait::async_trait;
use http::header;
use hyper::server::conn::AddrIncoming;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ServerAdapter, StartupError};
use crate::handler;

/// Payload bytes written per body frame when streaming a response.
const CHUNK_SIZE: usize = 4096;

/// The async pipeline backend on a plain hyper server.
///
/// Responses are streamed to the client in fixed-size frames through a
/// body channel rather than handed over as one buffer, the declared
/// `Content-Length` still covers the exact byte count.
pub struct HyperServer {
    port: u16,
    state: Option<RunningState>,
}

struct RunningState {
    port: u16,
    shutdown: oneshot::Sender<()>,
    server_task: JoinHandle<hyper::Result<()>>,
}

impl HyperServer {
    pub fn new(port: u16) -> Self {
        Self { port, state: None }
    }
}

#[async_trait]
impl ServerAdapter for HyperServer {
    fn name(&self) -> &'static str {
        "hyper"
    }

    fn version(&self) -> &'static str {
        "0.14"
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

        let make_service =
            make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(serve_request)) });

        let (shutdown, shutdown_rx) = oneshot::channel();
        let server = Server::builder(incoming)
            .serve(make_service)
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
            Ok(Ok(())) => debug!("Hyper server stopped."),
            Ok(Err(e)) => warn!(error = ?e, "Hyper server terminated with an error."),
            Err(_) => warn!("Hyper server task panicked."),
        }
    }
}

async fn serve_request(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let (parts, body) = req.into_parts();

    // Drain any request body before responding.
    let _ = hyper::body::to_bytes(body).await;

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let payload = handler::respond(&parts.method, target);

    let (mut sender, body) = Body::channel();
    let response = Response::builder()
        .status(payload.status)
        .header(header::CONTENT_TYPE, payload.content_type)
        .header(header::CONTENT_LENGTH, payload.body.len())
        .body(body)
        .expect("Build response");

    // Feed the payload to the client frame by frame as it drains.
    let mut remaining = payload.body;
    tokio::spawn(async move {
        while !remaining.is_empty() {
            let chunk = remaining.split_to(cmp::min(CHUNK_SIZE, remaining.len()));
            if sender.send_data(chunk).await.is_err() {
                // The client went away or never wanted the body.
                return;
            }
        }
    });

    Ok(response)
}
