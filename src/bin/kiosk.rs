use std::io;

use anyhow::Context;
use tracing::{error, info};

use rfid_attendance::config::KioskConfig;
use rfid_attendance::kiosk::render::ConsoleRenderer;
use rfid_attendance::kiosk::{Pipeline, ScanDispatcher, SerialPortOpener, UiDriver};
use rfid_attendance::telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = KioskConfig::from_env()?;

    let _guard = telemetry::init_tracing(&config.log_dir, "kiosk.log");

    info!(
        port = %config.serial_port,
        baud = config.baud_rate,
        api = %config.api_url,
        "Kiosk starting..."
    );

    let dispatcher = ScanDispatcher::new(&config.api_url, config.api_timeout, config.dispatch_workers)
        .context("Failed to build HTTP client")?;

    let opener = SerialPortOpener::new(config.serial_port.clone(), config.baud_rate);
    let mut pipeline = Pipeline::start(opener, &config).context("Failed to start reader thread")?;

    let driver = UiDriver::new(config.display_hold, dispatcher, ConsoleRenderer::new(io::stdout()));
    driver
        .run(&mut pipeline, config.ui_tick, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    pipeline.stop();
    info!("Kiosk stopped");
    Ok(())
}
