use std::time::Duration;

use colored::Colorize;
use servmark_core::{BenchmarkConfig, LoadDriver, ServerAdapter};

/// Idle time between two adapters so the previous backend's sockets
/// can drain before the next one binds the same port.
const COOLDOWN: Duration = Duration::from_secs(3);

/// Runs the comparison suite over the adapters in order.
///
/// Each adapter gets a warm-up pass at reduced volume whose report is
/// discarded, then the measured pass which is printed. A server which
/// fails to start is skipped and the rest of the suite still runs.
pub async fn run(mut adapters: Vec<Box<dyn ServerAdapter>>, config: BenchmarkConfig) {
    let warmup_driver = match LoadDriver::new(config.warmup()) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{}", e);
            return;
        },
    };
    let driver = match LoadDriver::new(config) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{}", e);
            return;
        },
    };

    let total = adapters.len();
    for (i, adapter) in adapters.iter_mut().enumerate() {
        if let Err(e) = adapter.start().await {
            error!(
                server = adapter.name(),
                error = %e,
                "Failed to start server, skipping it."
            );
            continue;
        }

        print_banner(adapter.as_ref());

        info!(server = adapter.name(), "Running warm-up pass.");
        warmup_driver.run().await;

        info!(server = adapter.name(), "Running measured pass.");
        let report = driver.run().await;
        println!("{}", report);

        adapter.shutdown().await;

        if i + 1 != total {
            tokio::time::sleep(COOLDOWN).await;
        }
    }
}

fn print_banner(adapter: &dyn ServerAdapter) {
    println!("{}", "-".repeat(52).bright_black());
    println!(
        "  {} {}",
        adapter.name().bold(),
        format!("({})", adapter.version()).bright_black(),
    );
    println!("{}", "-".repeat(52).bright_black());
}
