#[macro_use]
extern crate tracing;

use clap::{App, Arg, ArgMatches};
use http::Uri;
use servmark_core::{
    AxumServer,
    BenchmarkConfig,
    BlockingServer,
    HyperServer,
    ServerAdapter,
    TokioServer,
};

mod runtime;
mod suite;

/// servmark
///
/// Captures CLI arguments, builds the benchmark configuration and the
/// ordered list of server adapters, then runs the comparison suite.
fn main() {
    let args = parse_args();

    let requests: u64 = match args.value_of("requests").unwrap_or("100000").parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Invalid parameter for 'requests' given, input type must be a integer.");
            std::process::exit(1);
        },
    };

    let concurrency: usize = match args.value_of("concurrency").unwrap_or("50").parse()
    {
        Ok(v) => v,
        Err(_) => {
            println!("Invalid parameter for 'concurrency' given, input type must be a integer.");
            std::process::exit(1);
        },
    };

    let port: u16 = match args.value_of("port").unwrap_or("8989").parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Invalid parameter for 'port' given, input type must be a integer.");
            std::process::exit(1);
        },
    };

    let keep_alive: bool = args.is_present("keepalive");

    let raw_target = match args.value_of("url") {
        Some(v) => v.to_string(),
        None => format!("http://127.0.0.1:{}/rnd", port),
    };
    let target: Uri = match raw_target.parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Invalid parameter for 'url' given, input must be a valid URL.");
            std::process::exit(1);
        },
    };

    let config = match BenchmarkConfig::new(target, requests, concurrency, keep_alive) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", e);
            std::process::exit(1);
        },
    };

    tracing_subscriber::fmt::init();

    let adapters: Vec<Box<dyn ServerAdapter>> = vec![
        Box::new(BlockingServer::new(port)),
        Box::new(TokioServer::new(port)),
        Box::new(HyperServer::new(port)),
        Box::new(AxumServer::new(port)),
    ];

    let rt = runtime::get_rt();
    rt.block_on(suite::run(adapters, config));
}

/// Contains Clap's app setup.
fn parse_args() -> ArgMatches<'static> {
    App::new("servmark")
        .version("0.1.0")
        .about("Compare HTTP server implementations under one request load.")
        .arg(
            Arg::with_name("requests")
                .short("n")
                .long("requests")
                .help("Set the total amount of requests per run e.g. '-n 100000'")
                .takes_value(true)
                .default_value("100000")
        ).arg(
            Arg::with_name("concurrency")
                .short("c")
                .long("concurrency")
                .help("Set the amount of concurrent workers e.g. '-c 50'")
                .takes_value(true)
                .default_value("50")
        ).arg(
            Arg::with_name("keepalive")
                .short("k")
                .long("keepalive")
                .help("Reuse one connection per worker instead of reconnecting for every request e.g. '-k'")
                .takes_value(false)
                .required(false)
        ).arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .help("Set the port the servers bind to e.g. '-p 8989'")
                .takes_value(true)
                .default_value("8989")
        ).arg(
            Arg::with_name("url")
                .short("u")
                .long("url")
                .help("Override the target URL e.g. '-u http://127.0.0.1:8989/rnd?c=2048'")
                .takes_value(true)
                .required(false)
        ).get_matches()
}
