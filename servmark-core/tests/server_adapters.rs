use http::{header, Method, StatusCode};
use hyper::{Body, Client, Request};
use servmark_core::{
    AxumServer,
    BlockingServer,
    HyperServer,
    ServerAdapter,
    TokioServer,
};

#[tokio::test]
async fn test_blocking_server_contract() {
    exercise_adapter(Box::new(BlockingServer::new(0))).await;
}

#[tokio::test]
async fn test_tokio_server_contract() {
    exercise_adapter(Box::new(TokioServer::new(0))).await;
}

#[tokio::test]
async fn test_hyper_server_contract() {
    exercise_adapter(Box::new(HyperServer::new(0))).await;
}

#[tokio::test]
async fn test_axum_server_contract() {
    exercise_adapter(Box::new(AxumServer::new(0))).await;
}

#[tokio::test]
async fn test_port_released_after_shutdown() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");
    let port = server.port();
    server.shutdown().await;

    std::net::TcpListener::bind(("127.0.0.1", port)).expect("Rebind released port");
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");
    assert!(server.start().await.is_err());
    server.shutdown().await;
}

/// Drives the full endpoint contract against one adapter.
async fn exercise_adapter(mut adapter: Box<dyn ServerAdapter>) {
    let _ = tracing_subscriber::fmt::try_init();

    adapter.start().await.expect("Start server");
    let base = format!("http://127.0.0.1:{}", adapter.port());
    let client = Client::new();

    // No query string falls back to the default count.
    let resp = client
        .get(format!("{}/rnd", base).parse().expect("Parse URI"))
        .await
        .expect("Send request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("Read body");
    assert_eq!(body.len(), 100);

    // Exact requested count, printable bytes only.
    let resp = client
        .get(format!("{}/rnd?c=2048", base).parse().expect("Parse URI"))
        .await
        .expect("Send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("Read body");
    assert_eq!(body.len(), 2048);
    assert!(body.iter().all(|&b| (32..128).contains(&b)));

    // A count which does not parse is echoed back with a 400.
    let resp = client
        .get(format!("{}/rnd?c=abc", base).parse().expect("Parse URI"))
        .await
        .expect("Send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("Read body");
    assert!(std::str::from_utf8(&body)
        .expect("Read body text")
        .contains("abc"));

    // HEAD carries the exact length but no body.
    let request = Request::builder()
        .method(Method::HEAD)
        .uri(format!("{}/rnd?c=512", base))
        .body(Body::empty())
        .expect("Build request");
    let resp = client.request(request).await.expect("Send request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_LENGTH], "512");
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("Read body");
    assert!(body.is_empty());

    // POST passes the method gate, its body is discarded.
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("{}/rnd", base))
        .body(Body::from("ignored"))
        .expect("Build request");
    let resp = client.request(request).await.expect("Send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("Read body");
    assert_eq!(body.len(), 100);

    // Anything else is turned away.
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("{}/rnd", base))
        .body(Body::empty())
        .expect("Build request");
    let resp = client.request(request).await.expect("Send request");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    adapter.shutdown().await;
    // A second shutdown is a no-op.
    adapter.shutdown().await;
}
