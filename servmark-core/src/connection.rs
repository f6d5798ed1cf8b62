use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs};

use http::{header, HeaderValue, Request, StatusCode, Uri};
use hyper::client::conn;
use hyper::client::conn::SendRequest;
use hyper::Body;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Duration, Instant};

use crate::driver::DriverError;

/// The maximum number of attempts to try connect before aborting.
const RETRY_MAX: usize = 3;

#[derive(Clone)]
/// Builds client connections to the benchmark target.
pub(crate) struct Connector {
    uri: Uri,
    host_header: HeaderValue,
    addr: SocketAddr,
}

impl Connector {
    /// Creates a connector from the target URI.
    ///
    /// The host is resolved once up front so workers never pay for a
    /// lookup mid-run.
    pub(crate) fn from_uri(uri: &Uri) -> Result<Self, DriverError> {
        let scheme = uri.scheme_str().ok_or(DriverError::MissingScheme)?;
        if scheme != "http" {
            return Err(DriverError::InvalidScheme(scheme.to_string()));
        }

        let authority = uri.authority().ok_or(DriverError::MissingHost)?;
        let host = authority.host();
        let port = authority.port_u16().unwrap_or(80);

        // Prefer ipv4.
        let addr_iter = (host, port)
            .to_socket_addrs()
            .map_err(DriverError::AddressLookup)?;
        let mut last_addr = None;
        for addr in addr_iter {
            last_addr = Some(addr);
            if addr.is_ipv4() {
                break;
            }
        }
        let addr = last_addr.ok_or_else(|| {
            DriverError::AddressLookup(io::Error::new(
                ErrorKind::Other,
                "Failed to lookup hostname",
            ))
        })?;

        let host_header =
            HeaderValue::from_str(host).map_err(|_| DriverError::MissingHost)?;

        Ok(Self {
            uri: uri.clone(),
            host_header,
            addr,
        })
    }

    /// Builds one GET request against the target.
    pub(crate) fn new_request(&self) -> Request<Body> {
        let mut request = Request::new(Body::empty());
        (*request.uri_mut()) = self.uri.clone();
        request
            .headers_mut()
            .insert(header::HOST, self.host_header.clone());
        request
    }

    /// Establish a new connection within the given duration.
    ///
    /// Failed attempts are retried with a short pause in between. If
    /// the timeout elapses before any attempt succeeds, `None` is
    /// returned.
    pub(crate) async fn connect_timeout(
        &self,
        dur: Duration,
    ) -> anyhow::Result<Option<BenchConnection>> {
        let deadline = Instant::now() + dur;
        let mut last_error: Option<anyhow::Error> = None;
        let mut attempts_left = RETRY_MAX;

        loop {
            let result = timeout_at(deadline, self.connect()).await;

            match result {
                Err(_) => {
                    return if let Some(error) = last_error {
                        Err(error)
                    } else {
                        Ok(None)
                    }
                },
                Ok(Err(e)) => {
                    if attempts_left == 0 {
                        return Err(e);
                    }

                    attempts_left -= 1;
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                },
                Ok(Ok(connection)) => return Ok(Some(connection)),
            }
        }
    }

    /// Establish a new connection with no timeout.
    async fn connect(&self) -> anyhow::Result<BenchConnection> {
        let stream = TcpStream::connect(self.addr).await?;
        let (send_request, connection) = conn::Builder::new().handshake(stream).await?;
        let waiter = tokio::spawn(connection);

        Ok(BenchConnection {
            conn: send_request,
            waiter,
        })
    }
}

/// An established HTTP/1 connection to the target.
pub(crate) struct BenchConnection {
    /// The live connection to send requests.
    conn: SendRequest<Body>,
    /// The hyper connection task handle.
    waiter: JoinHandle<hyper::Result<()>>,
}

impl BenchConnection {
    /// Executes a request and drains the response body.
    pub(crate) async fn execute(
        &mut self,
        request: Request<Body>,
    ) -> Result<StatusCode, hyper::Error> {
        let resp = self.conn.send_request(request).await?;
        let status = resp.status();
        hyper::body::to_bytes(resp.into_body()).await?;
        Ok(status)
    }
}

impl Drop for BenchConnection {
    fn drop(&mut self) {
        self.waiter.abort();
    }
}
