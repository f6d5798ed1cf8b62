use std::io;

use async_trait::async_trait;
use http::Method;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{ServerAdapter, StartupError};
use crate::handler;

/// The reactor-style backend on raw tokio tasks.
///
/// A single accept task multiplexes the listener against a shutdown
/// signal and every connection becomes one lightweight task.
pub struct TokioServer {
    port: u16,
    state: Option<RunningState>,
}

struct RunningState {
    port: u16,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<io::Result<()>>,
}

impl TokioServer {
    pub fn new(port: u16) -> Self {
        Self { port, state: None }
    }
}

#[async_trait]
impl ServerAdapter for TokioServer {
    fn name(&self) -> &'static str {
        "tokio reactor"
    }

    fn version(&self) -> &'static str {
        "1"
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

        let (shutdown, shutdown_rx) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(listener, shutdown_rx));

        self.state = Some(RunningState {
            port,
            shutdown,
            accept_task,
        });

        Ok(())
    }

    async fn shutdown(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };

        let _ = state.shutdown.send(true);
        match state.accept_task.await {
            Ok(Ok(())) => debug!("Accept loop stopped."),
            Ok(Err(e)) => warn!(error = ?e, "Accept loop terminated with an error."),
            Err(_) => warn!("Accept loop task panicked."),
        }
    }
}

/// Accepts connections until the shutdown signal fires.
///
/// Dropping out of this function releases the listener. A terminal
/// accept error surfaces through the task's join handle.
async fn accept_loop(
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()> {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            accepted = listener.accept() => {
                let (stream, _) = accepted?;
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream).await {
                        debug!(error = ?e, "Connection closed with an I/O error.");
                    }
                });
            },
        }
    }
}

/// Serves requests on one connection until the client hangs up.
async fn serve_connection(stream: TcpStream) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await? == 0 {
            // Client closed the connection.
            return Ok(());
        }
        let request_line = request_line.trim_end();
        if request_line.is_empty() {
            continue;
        }

        let mut parts = request_line.split_whitespace();
        let (method, target) = match (parts.next(), parts.next()) {
            (Some(method), Some(target)) => (method, target),
            _ => return Ok(()),
        };
        let method = match Method::from_bytes(method.as_bytes()) {
            Ok(method) => method,
            Err(_) => return Ok(()),
        };

        let mut content_length = 0u64;
        let mut close = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }

            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                } else if name.eq_ignore_ascii_case("connection") {
                    close = value.eq_ignore_ascii_case("close");
                }
            }
        }

        // Drain any request body before responding.
        if content_length > 0 {
            tokio::io::copy(
                &mut (&mut reader).take(content_length),
                &mut tokio::io::sink(),
            )
            .await?;
        }

        let payload = handler::respond(&method, target);

        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            payload.status.as_u16(),
            payload.status.canonical_reason().unwrap_or(""),
            payload.content_type,
            payload.body.len(),
        );
        write_half.write_all(head.as_bytes()).await?;
        if method != Method::HEAD {
            write_half.write_all(&payload.body).await?;
        }
        write_half.flush().await?;

        if close {
            return Ok(());
        }
    }
}
