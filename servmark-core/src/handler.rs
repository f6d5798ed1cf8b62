use http::{Method, StatusCode};
use hyper::body::Bytes;
use rand::Rng;

/// The number of payload bytes returned when the query does not
/// specify a count.
pub const DEFAULT_BYTE_COUNT: usize = 100;

#[derive(Debug, Clone)]
/// A fully formed response ready to be written by a backend binding.
pub struct Payload {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Produces the response for one request to the random data endpoint.
///
/// This is the request semantics shared by every backend, the
/// per-backend bindings only perform the socket plumbing around it.
/// `target` is the raw request target including any query string.
pub fn respond(method: &Method, target: &str) -> Payload {
    match *method {
        Method::GET | Method::HEAD | Method::POST => (),
        _ => {
            return Payload {
                status: StatusCode::METHOD_NOT_ALLOWED,
                content_type: "text/plain",
                body: Bytes::from(format!("{} method not supported", method)),
            }
        },
    }

    let count = match parse_count(target) {
        Ok(count) => count,
        Err(raw) => {
            return Payload {
                status: StatusCode::BAD_REQUEST,
                content_type: "text/plain",
                body: Bytes::from(format!("Invalid query format: {}", raw)),
            }
        },
    };

    Payload {
        status: StatusCode::OK,
        content_type: "text/plain",
        body: random_body(count),
    }
}

/// Extracts the requested byte count from the request target.
///
/// Only a query of the shape `c=<int>` selects a count, anything else
/// falls back to the default. A `c` value which does not parse is
/// returned as the error so it can be echoed back to the client.
fn parse_count(target: &str) -> Result<usize, &str> {
    let query = match target.split_once('?') {
        Some((_, query)) => query,
        None => return Ok(DEFAULT_BYTE_COUNT),
    };

    match query.strip_prefix("c=") {
        Some(raw) => raw.parse().map_err(|_| raw),
        None => Ok(DEFAULT_BYTE_COUNT),
    }
}

/// Fills a buffer of `count` printable ASCII bytes.
///
/// The contents derive from a throwaway seed, the data only has to be
/// plausible filler rather than reproducible across runs.
fn random_body(count: usize) -> Bytes {
    let seed = rand::thread_rng().gen::<u32>() as usize;

    let mut buf = Vec::with_capacity(count);
    for i in 0..count {
        buf.push((seed.wrapping_add(i) % 96 + 32) as u8);
    }

    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_length_and_range() {
        for count in [0, 1, 100, 2048] {
            let payload = respond(&Method::GET, &format!("/rnd?c={}", count));
            assert_eq!(payload.status, StatusCode::OK);
            assert_eq!(payload.content_type, "text/plain");
            assert_eq!(payload.body.len(), count);
            assert!(payload.body.iter().all(|&b| (32..128).contains(&b)));
        }
    }

    #[test]
    fn test_no_query_uses_default_count() {
        let payload = respond(&Method::GET, "/rnd");
        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.body.len(), DEFAULT_BYTE_COUNT);
    }

    #[test]
    fn test_foreign_query_uses_default_count() {
        let payload = respond(&Method::GET, "/rnd?x=42");
        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.body.len(), DEFAULT_BYTE_COUNT);
    }

    #[test]
    fn test_invalid_count_is_rejected() {
        let payload = respond(&Method::GET, "/rnd?c=abc");
        assert_eq!(payload.status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.body, Bytes::from("Invalid query format: abc"));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let payload = respond(&Method::GET, "/rnd?c=-1");
        assert_eq!(payload.status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.body, Bytes::from("Invalid query format: -1"));
    }

    #[test]
    fn test_method_gate() {
        for method in [Method::GET, Method::HEAD, Method::POST] {
            let payload = respond(&method, "/rnd");
            assert_eq!(payload.status, StatusCode::OK);
        }

        let payload = respond(&Method::DELETE, "/rnd");
        assert_eq!(payload.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(payload.body, Bytes::from("DELETE method not supported"));
    }
}
