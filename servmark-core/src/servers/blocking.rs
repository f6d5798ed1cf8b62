use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use http::Method;

use super::{ServerAdapter, StartupError};
use crate::handler::{self, Payload};

/// The thread-per-connection backend on std blocking sockets.
///
/// A dedicated thread sits in `accept` and every accepted connection
/// gets its own thread which serves requests until the client closes
/// the connection.
pub struct BlockingServer {
    port: u16,
    state: Option<RunningState>,
}

struct RunningState {
    port: u16,
    stop: Arc<AtomicBool>,
    listener_thread: JoinHandle<io::Result<()>>,
}

impl BlockingServer {
    pub fn new(port: u16) -> Self {
        Self { port, state: None }
    }
}

#[async_trait]
impl ServerAdapter for BlockingServer {
    fn name(&self) -> &'static str {
        "blocking sockets"
    }

    fn version(&self) -> &'static str {
        "unknown"
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

        let listener =
            TcpListener::bind(("127.0.0.1", self.port)).map_err(StartupError::Bind)?;
        let port = listener.local_addr().map_err(StartupError::Bind)?.port();

        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = stop.clone();
        let listener_thread = std::thread::Builder::new()
            .name("servmark-accept".to_string())
            .spawn(move || accept_loop(listener, loop_stop))
            .map_err(StartupError::Bind)?;

        self.state = Some(RunningState {
            port,
            stop,
            listener_thread,
        });

        Ok(())
    }

    async fn shutdown(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };

        state.stop.store(true, Ordering::Relaxed);

        // Unblock the accept call with a throwaway loopback connection.
        let _ = tokio::net::TcpStream::connect(("127.0.0.1", state.port)).await;

        let joined =
            tokio::task::spawn_blocking(move || state.listener_thread.join()).await;
        match joined {
            Ok(Ok(Ok(()))) => debug!("Accept loop stopped."),
            Ok(Ok(Err(e))) => {
                warn!(error = ?e, "Accept loop terminated with an error.")
            },
            Ok(Err(_)) | Err(_) => warn!("Accept loop thread panicked."),
        }
    }
}

/// Accepts connections until the stop flag is raised.
///
/// An accept error raised by our own shutdown is expected and folded
/// into a clean exit, any other error stops the loop and surfaces
/// through the thread's join result.
fn accept_loop(listener: TcpListener, stop: Arc<AtomicBool>) -> io::Result<()> {
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                if stop.load(Ordering::Relaxed) {
                    return Ok(());
                }

                std::thread::spawn(move || {
                    if let Err(e) = serve_connection(stream) {
                        debug!(error = ?e, "Connection closed with an I/O error.");
                    }
                });
            },
            Err(e) => {
                if stop.load(Ordering::Relaxed) {
                    return Ok(());
                }
                return Err(e);
            },
        }
    }
}

/// Serves requests on one connection until the client hangs up.
fn serve_connection(stream: TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut stream = stream;

    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line)? == 0 {
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
            // A malformed head is not worth answering.
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
            if reader.read_line(&mut line)? == 0 {
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
            io::copy(&mut (&mut reader).take(content_length), &mut io::sink())?;
        }

        let payload = handler::respond(&method, target);
        write_response(&mut stream, &method, &payload)?;

        if close {
            return Ok(());
        }
    }
}

fn write_response(
    stream: &mut TcpStream,
    method: &Method,
    payload: &Payload,
) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        payload.status.as_u16(),
        payload.status.canonical_reason().unwrap_or(""),
        payload.content_type,
        payload.body.len(),
    );

    stream.write_all(head.as_bytes())?;
    if *method != Method::HEAD {
        stream.write_all(&payload.body)?;
    }
    stream.flush()
}
