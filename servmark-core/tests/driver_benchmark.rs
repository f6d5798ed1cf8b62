use servmark_core::{BenchmarkConfig, LoadDriver, ServerAdapter, TokioServer};

#[tokio::test]
async fn test_driver_end_to_end() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    let config = config_for(&server, 1000, 10, true);
    let driver = LoadDriver::new(config).expect("Create driver");
    let report = driver.run().await;

    assert_eq!(report.total_requests, 1000);
    assert_eq!(report.total_errors, 0);
    assert!(report.elapsed.as_nanos() > 0);
    assert!(report.requests_sec > 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_driver_more_workers_than_requests() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    let config = config_for(&server, 3, 8, true);
    let driver = LoadDriver::new(config).expect("Create driver");
    let report = driver.run().await;

    assert_eq!(report.total_requests, 3);
    assert_eq!(report.total_errors, 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_driver_zero_requests() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    let config = config_for(&server, 0, 4, true);
    let driver = LoadDriver::new(config).expect("Create driver");
    let report = driver.run().await;

    assert_eq!(report.total_requests, 0);
    assert_eq!(report.total_errors, 0);
    assert_eq!(report.requests_sec, 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_driver_without_keep_alive() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    let config = config_for(&server, 50, 5, false);
    let driver = LoadDriver::new(config).expect("Create driver");
    let report = driver.run().await;

    assert_eq!(report.total_requests, 50);
    assert_eq!(report.total_errors, 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_driver_counts_non_success_responses() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    // Every response is a 400, the requests still count as attempted.
    let target = format!("http://127.0.0.1:{}/rnd?c=abc", server.port())
        .parse()
        .expect("Parse URI");
    let config = BenchmarkConfig::new(target, 40, 4, true).expect("Create config");
    let driver = LoadDriver::new(config).expect("Create driver");
    let report = driver.run().await;

    assert_eq!(report.total_requests, 40);
    assert_eq!(report.total_errors, 40);

    server.shutdown().await;
}

#[tokio::test]
async fn test_driver_run_is_cancellable() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = TokioServer::new(0);
    server.start().await.expect("Start server");

    let config = config_for(&server, 1_000_000, 4, true);
    let driver = LoadDriver::new(config).expect("Create driver");
    driver.shutdown_handle().set_abort();
    let report = driver.run().await;

    assert_eq!(report.total_requests, 0);

    server.shutdown().await;
}

fn config_for(
    server: &TokioServer,
    total_requests: u64,
    concurrency: usize,
    keep_alive: bool,
) -> BenchmarkConfig {
    let target = format!("http://127.0.0.1:{}/rnd?c=2048", server.port())
        .parse()
        .expect("Parse URI");
    BenchmarkConfig::new(target, total_requests, concurrency, keep_alive)
        .expect("Create config")
}
